//! In-memory driver for unit tests
//!
//! Answers every invocation through a closure and records what was run, how
//! many connects were attempted and how many writes were committed.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::{DatabaseType, Driver, Invocation, Row};
use crate::error::{NgoError, Result};

type Responder = Box<dyn FnMut(&Invocation) -> Result<Vec<Row>>>;
pub(crate) type SharedLog = Rc<RefCell<ScriptLog>>;

#[derive(Debug, Default)]
pub(crate) struct ScriptLog {
    pub connected: bool,
    pub refuse_connect: bool,
    pub connect_attempts: usize,
    pub fetched: Vec<Invocation>,
    pub committed: Vec<Invocation>,
}

pub(crate) struct ScriptedDriver {
    log: Rc<RefCell<ScriptLog>>,
    responder: Responder,
}

impl ScriptedDriver {
    pub(crate) fn new(
        responder: impl FnMut(&Invocation) -> Result<Vec<Row>> + 'static,
    ) -> (Self, SharedLog) {
        let log = Rc::new(RefCell::new(ScriptLog::default()));
        (Self { log: Rc::clone(&log), responder: Box::new(responder) }, log)
    }
}

impl Driver for ScriptedDriver {
    fn engine(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn connect(&mut self) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.connect_attempts += 1;
        if log.refuse_connect {
            log.connected = false;
            return Err(NgoError::connection_failed("scripted refusal"));
        }
        log.connected = true;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.log.borrow().connected
    }

    fn disconnect(&mut self) {
        self.log.borrow_mut().connected = false;
    }

    fn fetch(&mut self, invocation: &Invocation) -> Result<Vec<Row>> {
        self.log.borrow_mut().fetched.push(invocation.clone());
        (self.responder)(invocation)
    }

    fn execute_and_commit(&mut self, invocation: &Invocation) -> Result<u64> {
        (self.responder)(invocation)?;
        self.log.borrow_mut().committed.push(invocation.clone());
        Ok(1)
    }
}
