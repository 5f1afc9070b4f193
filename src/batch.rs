//! Batch runner: replays a CSV file of requests against a dispatcher.
//!
//! Requests run one at a time, in file order. A failed request is recorded
//! and the batch moves on; the failure leaves no trace in the store.

use crate::auth::IdentityResolver;
use crate::dispatch::{Dispatcher, Response};
use crate::error::Result;
use crate::request::{RequestKind, RequestRecord};
use crate::store::RecordStore;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::io::{Read, Write};

/// What happened to one request row.
#[derive(Debug)]
pub struct Outcome {
    /// 1-indexed line number in the input, counting the header.
    pub row: usize,

    /// Request kind as written, empty if the row could not be read.
    pub kind: String,

    pub function: String,

    pub result: Result<Response>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Drives a [`Dispatcher`] from CSV input and reports one outcome per row.
pub struct BatchRunner<S> {
    dispatcher: Dispatcher<S>,
    outcomes: Vec<Outcome>,
}

impl<S: RecordStore> BatchRunner<S> {
    pub fn new(dispatcher: Dispatcher<S>) -> Self {
        BatchRunner {
            dispatcher,
            outcomes: Vec::new(),
        }
    }

    /// Runs every request row from a CSV reader.
    ///
    /// Only failure to read the input at all is returned as an error;
    /// unreadable rows and rejected requests become failed outcomes.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.records().enumerate() {
            let row = row_idx + 2; // 1-indexed, accounting for header row

            let outcome = match result {
                Ok(record) => match RequestRecord::from_row(&record) {
                    Ok(request) => Outcome {
                        row,
                        kind: request.kind.to_string(),
                        function: request.function.clone(),
                        result: self.run_request(&request),
                    },
                    Err(e) => {
                        warn!("Row {}: {}", row, e);
                        Outcome {
                            row,
                            kind: record.get(0).unwrap_or_default().to_string(),
                            function: record.get(3).unwrap_or_default().to_string(),
                            result: Err(e),
                        }
                    }
                },
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row, e);
                    Outcome {
                        row,
                        kind: String::new(),
                        function: String::new(),
                        result: Err(e.into()),
                    }
                }
            };
            self.outcomes.push(outcome);
        }

        let failed = self.outcomes.iter().filter(|o| !o.is_ok()).count();
        debug!("Processed {} request(s), {} failed", self.outcomes.len(), failed);
        Ok(())
    }

    fn run_request(&mut self, request: &RequestRecord) -> Result<Response> {
        let args = request.dispatch_args();
        match request.kind {
            RequestKind::Invoke => {
                let identity: &dyn IdentityResolver = &request.identity;
                self.dispatcher.invoke(identity, &request.function, &args)
            }
            RequestKind::Query => self.dispatcher.query(&request.function, &args),
        }
    }

    /// Writes one CSV line per processed row.
    ///
    /// `response` holds the payload of a successful request, empty for a
    /// write, or the error message of a failed one.
    pub fn write_output<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["row", "kind", "function", "status", "response"])?;

        for outcome in &self.outcomes {
            let (status, response) = match &outcome.result {
                Ok(response) => ("ok", response.as_str().to_string()),
                Err(e) => ("error", e.to_string()),
            };
            csv_writer.write_record([
                outcome.row.to_string(),
                outcome.kind.clone(),
                outcome.function.clone(),
                status.to_string(),
                response,
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn into_dispatcher(self) -> Dispatcher<S> {
        self.dispatcher
    }
}
