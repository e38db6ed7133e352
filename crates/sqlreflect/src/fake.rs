//! A scripted queryer for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{BoxError, QueryFuture, Queryer, Record, Value};

/// One query the fake received.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub args: Vec<Value>,
}

/// Replays queued responses in order and records every call.
///
/// Running out of responses is an error, so a test that issues one query
/// more than it scripted fails loudly.
#[derive(Debug, Default)]
pub struct FakeQueryer {
    responses: Mutex<VecDeque<Result<Vec<Record>, String>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeQueryer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue rows for the next query.
    pub fn respond(&self, records: Vec<Record>) {
        self.responses.lock().unwrap().push_back(Ok(records));
    }

    /// Queue a failure for the next query.
    pub fn fail(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_owned()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl Queryer for FakeQueryer {
    fn query<'a>(&'a self, sql: &'a str, args: &'a [Value]) -> QueryFuture<'a> {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_owned(),
            args: args.to_vec(),
        });
        let next = self.responses.lock().unwrap().pop_front();
        Box::pin(async move {
            match next {
                Some(Ok(records)) => Ok(records),
                Some(Err(message)) => Err(BoxError::from(message)),
                None => Err(BoxError::from(format!("unscripted query: {sql}"))),
            }
        })
    }
}
