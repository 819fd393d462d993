use tracing::debug;

use crate::action::handler::Engine;
use crate::browser::driver::Driver;
use crate::component::identifier::Blocker;
use crate::component::table::TableView;
use crate::error::{Diagnostic, EngineError};
use crate::locate::locator::ResolveOptions;
use crate::locate::request::IdentificationRequest;
use crate::locate::strategy::Strategy;

// ============================================================================
// Read-only table queries
// ============================================================================

impl<D: Driver> Engine<D> {
    /// Headers and body rows of the table `request` resolves to, read from
    /// the live page.
    pub fn read_table(&mut self, request: &IdentificationRequest) -> Result<TableView, EngineError> {
        self.live_table(request).map(|(view, _)| view)
    }

    /// Text of the cell at 0-based `row` under the column headed `column`.
    pub fn read_cell(
        &mut self,
        request: &IdentificationRequest,
        row: usize,
        column: &str,
    ) -> Result<String, EngineError> {
        let (view, mut diagnostic) = self.live_table(request)?;
        if view.column(column).is_none() {
            diagnostic
                .trace
                .note(Strategy::ExactLabel, 0, format!("no column '{column}' in {:?}", view.headers));
            return Err(EngineError::NotFound { diagnostic });
        }
        match view.cell(row, column) {
            Some(text) => Ok(text.to_string()),
            None => {
                diagnostic
                    .trace
                    .note(Strategy::Position, 0, format!("{} row(s), row {row} out of range", view.rows.len()));
                Err(EngineError::NotFound { diagnostic })
            }
        }
    }

    /// 0-based index of the first row whose cell under `column` equals
    /// `value`.
    pub fn find_row(
        &mut self,
        request: &IdentificationRequest,
        column: &str,
        value: &str,
    ) -> Result<usize, EngineError> {
        let (view, mut diagnostic) = self.live_table(request)?;
        match view.find_row(column, value) {
            Some(row) => Ok(row),
            None => {
                let note = if view.column(column).is_none() {
                    format!("no column '{column}' in {:?}", view.headers)
                } else {
                    format!("no row with {column} = '{value}'")
                };
                diagnostic.trace.note(Strategy::ExactLabel, 0, note);
                Err(EngineError::NotFound { diagnostic })
            }
        }
    }

    fn live_table(&mut self, request: &IdentificationRequest) -> Result<(TableView, Diagnostic), EngineError> {
        let resolution = self.resolve(request, &ResolveOptions::default())?;
        let diagnostic = Diagnostic::new(request.clone(), resolution.trace.clone());

        if !resolution.candidate.is_kind("table") {
            let kind = resolution.candidate.kind.as_deref().unwrap_or("unclassified");
            return Err(EngineError::Unsupported {
                diagnostic,
                action: "read_table".to_string(),
                reason: format!("'{kind}' elements have no rows"),
            });
        }

        let raw = match self.driver_mut().refresh(resolution.candidate.handle()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                return Err(EngineError::NotInteractable {
                    diagnostic,
                    blocker: Blocker::Detached,
                });
            }
            Err(e) => return Err(EngineError::driver_failed(&diagnostic, "reading table rows", e)),
        };

        let view = TableView::from_raw(&raw);
        debug!(request = %request, rows = view.rows.len(), "table read");
        Ok((view, diagnostic))
    }
}
