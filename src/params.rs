//! Typed request parameter decoding.
//!
//! # Responsibilities
//! - Declare typed fields with defaults and help text, returning live
//!   handles seeded with the defaults
//! - Decode the request's form store into those handles
//! - Report every declared field for endpoint self-description
//!
//! # Design Decisions
//! - Handles are `Rc`-shared cells: a `Params` is built and read inside a
//!   single handler invocation, never across threads
//! - Unknown form keys are skipped, so unrelated query noise never fails
//!   a request
//! - A bool field given a valueless key (`?verbose`) reads as `true`
//! - Slice fields split every value on commas and append; scalar fields
//!   keep the last value seen

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::http::form::FormValues;

/// Decode faults: a declared field saw a value it cannot parse.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("invalid value {value:?} for parameter '{name}' ({kind})")]
    Invalid {
        name: String,
        value: String,
        kind: &'static str,
    },
}

fn invalid(name: &str, value: &str, kind: &'static str) -> ParamsError {
    ParamsError::Invalid {
        name: name.to_owned(),
        value: value.to_owned(),
        kind,
    }
}

/// One declared field's description, for self-describing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ParamUsage {
    pub name: String,
    pub kind: String,
    pub help: String,
}

enum Slot {
    Bool(Rc<Cell<bool>>),
    Int(Rc<Cell<i64>>),
    Uint(Rc<Cell<u64>>),
    Float(Rc<Cell<f64>>),
    Duration(Rc<Cell<Duration>>),
    Str(Rc<RefCell<String>>),
    BoolSlice(Rc<RefCell<Vec<bool>>>),
    IntSlice(Rc<RefCell<Vec<i64>>>),
    UintSlice(Rc<RefCell<Vec<u64>>>),
    FloatSlice(Rc<RefCell<Vec<f64>>>),
    DurationSlice(Rc<RefCell<Vec<Duration>>>),
    StrSlice(Rc<RefCell<Vec<String>>>),
}

struct Field {
    kind: &'static str,
    help: String,
    slot: Slot,
}

impl Field {
    fn assign(&self, name: &str, raw: &str) -> Result<(), ParamsError> {
        match &self.slot {
            Slot::Bool(cell) => {
                // A key with no value flips the flag on.
                let value = if raw.is_empty() {
                    true
                } else {
                    parse_bool(raw).ok_or_else(|| invalid(name, raw, self.kind))?
                };
                cell.set(value);
            }
            Slot::Int(cell) => {
                cell.set(raw.parse().map_err(|_| invalid(name, raw, self.kind))?);
            }
            Slot::Uint(cell) => {
                cell.set(raw.parse().map_err(|_| invalid(name, raw, self.kind))?);
            }
            Slot::Float(cell) => {
                cell.set(raw.parse().map_err(|_| invalid(name, raw, self.kind))?);
            }
            Slot::Duration(cell) => {
                cell.set(parse_duration(raw).ok_or_else(|| invalid(name, raw, self.kind))?);
            }
            Slot::Str(cell) => {
                *cell.borrow_mut() = raw.to_owned();
            }
            Slot::BoolSlice(cell) => {
                for piece in raw.split(',') {
                    let value = parse_bool(piece).ok_or_else(|| invalid(name, piece, self.kind))?;
                    cell.borrow_mut().push(value);
                }
            }
            Slot::IntSlice(cell) => {
                for piece in raw.split(',') {
                    let value = piece.parse().map_err(|_| invalid(name, piece, self.kind))?;
                    cell.borrow_mut().push(value);
                }
            }
            Slot::UintSlice(cell) => {
                for piece in raw.split(',') {
                    let value = piece.parse().map_err(|_| invalid(name, piece, self.kind))?;
                    cell.borrow_mut().push(value);
                }
            }
            Slot::FloatSlice(cell) => {
                for piece in raw.split(',') {
                    let value = piece.parse().map_err(|_| invalid(name, piece, self.kind))?;
                    cell.borrow_mut().push(value);
                }
            }
            Slot::DurationSlice(cell) => {
                for piece in raw.split(',') {
                    let value =
                        parse_duration(piece).ok_or_else(|| invalid(name, piece, self.kind))?;
                    cell.borrow_mut().push(value);
                }
            }
            Slot::StrSlice(cell) => {
                for piece in raw.split(',') {
                    cell.borrow_mut().push(piece.to_owned());
                }
            }
        }
        Ok(())
    }
}

/// Declaration-based decoder over a request's form store.
///
/// Declare fields up front, run [`parse`](Self::parse), then read the
/// returned handles.
#[derive(Default)]
pub struct Params {
    fields: HashMap<String, Field>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    fn declare(&mut self, name: &str, kind: &'static str, help: &str, slot: Slot) {
        self.fields.insert(
            name.to_owned(),
            Field {
                kind,
                help: help.to_owned(),
                slot,
            },
        );
    }

    pub fn bool(&mut self, name: &str, default: bool, help: &str) -> Rc<Cell<bool>> {
        let handle = Rc::new(Cell::new(default));
        self.declare(name, "bool", help, Slot::Bool(handle.clone()));
        handle
    }

    pub fn int(&mut self, name: &str, default: i64, help: &str) -> Rc<Cell<i64>> {
        let handle = Rc::new(Cell::new(default));
        self.declare(name, "int", help, Slot::Int(handle.clone()));
        handle
    }

    pub fn uint(&mut self, name: &str, default: u64, help: &str) -> Rc<Cell<u64>> {
        let handle = Rc::new(Cell::new(default));
        self.declare(name, "uint", help, Slot::Uint(handle.clone()));
        handle
    }

    pub fn float(&mut self, name: &str, default: f64, help: &str) -> Rc<Cell<f64>> {
        let handle = Rc::new(Cell::new(default));
        self.declare(name, "float", help, Slot::Float(handle.clone()));
        handle
    }

    pub fn duration(&mut self, name: &str, default: Duration, help: &str) -> Rc<Cell<Duration>> {
        let handle = Rc::new(Cell::new(default));
        self.declare(name, "duration", help, Slot::Duration(handle.clone()));
        handle
    }

    pub fn string(&mut self, name: &str, default: &str, help: &str) -> Rc<RefCell<String>> {
        let handle = Rc::new(RefCell::new(default.to_owned()));
        self.declare(name, "string", help, Slot::Str(handle.clone()));
        handle
    }

    pub fn bool_slice(
        &mut self,
        name: &str,
        default: Vec<bool>,
        help: &str,
    ) -> Rc<RefCell<Vec<bool>>> {
        let handle = Rc::new(RefCell::new(default));
        self.declare(name, "[]bool", help, Slot::BoolSlice(handle.clone()));
        handle
    }

    pub fn int_slice(
        &mut self,
        name: &str,
        default: Vec<i64>,
        help: &str,
    ) -> Rc<RefCell<Vec<i64>>> {
        let handle = Rc::new(RefCell::new(default));
        self.declare(name, "[]int", help, Slot::IntSlice(handle.clone()));
        handle
    }

    pub fn uint_slice(
        &mut self,
        name: &str,
        default: Vec<u64>,
        help: &str,
    ) -> Rc<RefCell<Vec<u64>>> {
        let handle = Rc::new(RefCell::new(default));
        self.declare(name, "[]uint", help, Slot::UintSlice(handle.clone()));
        handle
    }

    pub fn float_slice(
        &mut self,
        name: &str,
        default: Vec<f64>,
        help: &str,
    ) -> Rc<RefCell<Vec<f64>>> {
        let handle = Rc::new(RefCell::new(default));
        self.declare(name, "[]float", help, Slot::FloatSlice(handle.clone()));
        handle
    }

    pub fn duration_slice(
        &mut self,
        name: &str,
        default: Vec<Duration>,
        help: &str,
    ) -> Rc<RefCell<Vec<Duration>>> {
        let handle = Rc::new(RefCell::new(default));
        self.declare(name, "[]duration", help, Slot::DurationSlice(handle.clone()));
        handle
    }

    pub fn string_slice(
        &mut self,
        name: &str,
        default: Vec<String>,
        help: &str,
    ) -> Rc<RefCell<Vec<String>>> {
        let handle = Rc::new(RefCell::new(default));
        self.declare(name, "[]string", help, Slot::StrSlice(handle.clone()));
        handle
    }

    /// Decode `form` into the declared handles. Keys with no declared
    /// field are skipped; the first malformed value aborts with an error.
    pub fn parse(&self, form: &FormValues) -> Result<(), ParamsError> {
        for (name, values) in form.iter() {
            let field = match self.fields.get(name) {
                Some(field) => field,
                None => continue,
            };
            for value in values {
                field.assign(name, value)?;
            }
        }
        Ok(())
    }

    /// Every declared field, keyed and sorted by name.
    pub fn usage(&self) -> BTreeMap<String, ParamUsage> {
        self.fields
            .iter()
            .map(|(name, field)| {
                (
                    name.clone(),
                    ParamUsage {
                        name: name.clone(),
                        kind: field.kind.to_owned(),
                        help: field.help.clone(),
                    },
                )
            })
            .collect()
    }
}

/// Bool text accepted by the decoder, after Go's `strconv.ParseBool`.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a Go-style duration string: one or more `<number><unit>` terms,
/// units `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`, fractional numbers
/// allowed. `"0"` alone is accepted; a bare number without a unit is not.
fn parse_duration(raw: &str) -> Option<Duration> {
    if raw == "0" {
        return Some(Duration::ZERO);
    }
    if raw.is_empty() {
        return None;
    }

    const UNITS: [(&str, f64); 7] = [
        ("ns", 1e-9),
        ("us", 1e-6),
        ("\u{b5}s", 1e-6),
        ("ms", 1e-3),
        ("s", 1.0),
        ("m", 60.0),
        ("h", 3600.0),
    ];

    let mut total = 0_f64;
    let mut rest = raw;
    while !rest.is_empty() {
        let bytes = rest.as_bytes();
        let mut end = 0;
        let mut seen_dot = false;
        while end < bytes.len()
            && (bytes[end].is_ascii_digit() || (bytes[end] == b'.' && !seen_dot))
        {
            if bytes[end] == b'.' {
                seen_dot = true;
            }
            end += 1;
        }
        if end == 0 {
            return None;
        }
        let value: f64 = rest[..end].parse().ok()?;
        rest = &rest[end..];

        let (unit, scale) = UNITS.iter().find(|(u, _)| rest.starts_with(u))?;
        total += value * scale;
        rest = &rest[unit.len()..];
    }
    Duration::try_from_secs_f64(total).ok()
}
