use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use pvm::Address;

/// A settable-once code address.
///
/// Created unset when a procedure declaration is built, set exactly once
/// when the procedure's body has been placed, and shared between the
/// declaration and every call site that referenced the procedure before its
/// address was known. Setting a label twice or reading an unset one is a
/// compiler bug and panics.
#[derive(Clone)]
pub struct Label {
    addr: Rc<Cell<Option<Address>>>,
}

impl Label {
    pub fn new() -> Label {
        Label {
            addr: Rc::new(Cell::new(None)),
        }
    }

    pub fn is_set(&self) -> bool {
        self.addr.get().is_some()
    }

    pub fn set(&self, addr: Address) {
        if self.is_set() {
            panic!("internal error: label set twice");
        }
        self.addr.set(Some(addr));
    }

    pub fn read(&self) -> Address {
        match self.addr.get() {
            Some(addr) => addr,
            None => panic!("internal error: reading an unset label"),
        }
    }
}

impl Default for Label {
    fn default() -> Label {
        Label::new()
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Label({:?})", self.addr.get())
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Label) -> bool {
        self.addr.get() == other.addr.get()
    }
}
