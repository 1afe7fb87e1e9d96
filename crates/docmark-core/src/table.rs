use docmark_document::{DocumentService, Request, TableLayout};
use docmark_markdown::{compile_inline, TableDescriptor};

use crate::error::{DocmarkError, DocmarkResult};
use crate::requests::to_request;

/// Result of inserting a document's deferred tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TablePass {
    pub inserted: usize,
    /// Net index drift introduced by all tables inserted so far.
    pub cumulative_offset: usize,
}

/// Inserts tables into a live document and fills their cells.
pub struct TableInserter<'a> {
    service: &'a dyn DocumentService,
    document_id: &'a str,
}

impl<'a> TableInserter<'a> {
    pub fn new(service: &'a dyn DocumentService, document_id: &'a str) -> Self {
        Self {
            service,
            document_id,
        }
    }

    /// Inserts `tables` in order. Each table lands at its compiled anchor
    /// offset shifted by the drift of the tables before it; `live_end` is the
    /// document's end index after the text insert and bounds every offset.
    pub fn insert_all(&self, tables: &[TableDescriptor], live_end: usize) -> DocmarkResult<TablePass> {
        let mut pass = TablePass::default();
        let mut live_end = live_end;

        for (position, table) in tables.iter().enumerate() {
            let offset = table.start_offset + pass.cumulative_offset;
            if offset == 0 || offset >= live_end {
                return Err(DocmarkError::OffsetInvariant(format!(
                    "table {position} anchor at index {offset} is outside the live document [1, {live_end})"
                )));
            }

            let end = self
                .insert_table(offset, table)
                .map_err(|err| {
                    let applied = position > 0 || matches!(err, DocmarkError::PartialApply { .. });
                    if applied {
                        DocmarkError::PartialApply {
                            step: "table insertion",
                            completed: position,
                            total: tables.len(),
                            source: Box::new(err),
                        }
                    } else {
                        err
                    }
                })?;

            let drift = (end - offset) - 1;
            pass.cumulative_offset += drift;
            pass.inserted += 1;
            live_end += drift;
            log::debug!(
                "inserted {}x{} table at index {offset}, cumulative offset {}",
                table.rows(),
                table.cols(),
                pass.cumulative_offset
            );
        }

        Ok(pass)
    }

    /// Replaces the anchor unit at `offset` with an empty table, then writes
    /// each non-empty cell top to bottom, left to right. Returns the index
    /// immediately after the populated table.
    pub fn insert_table(&self, offset: usize, table: &TableDescriptor) -> DocmarkResult<usize> {
        let layout = TableLayout::new(table.rows(), table.cols());
        let structure = [
            Request::DeleteContentRange {
                start_index: offset,
                end_index: offset + 1,
            },
            to_request(&table.insert_operation(offset)),
        ];
        self.service.batch_update(self.document_id, &structure)?;

        let cells: Vec<(usize, usize)> = (0..layout.rows)
            .flat_map(|row| (0..layout.cols).map(move |col| (row, col)))
            .filter(|&(row, col)| !table.cell_text(row, col).is_empty())
            .collect();
        let total = cells.len();
        let mut written = 0;

        for (completed, &(row, col)) in cells.iter().enumerate() {
            let index = layout.cell_index(offset, row, col) + written;
            let compiled = compile_inline(&table.cells[row][col], index);
            let mut requests = vec![to_request(&compiled.text_insert())];
            requests.extend(compiled.operations.iter().map(to_request));

            if let Err(err) = self.service.batch_update(self.document_id, &requests) {
                return Err(DocmarkError::PartialApply {
                    step: "table population",
                    completed,
                    total,
                    source: Box::new(err.into()),
                });
            }
            written += compiled.end_offset() - index;
        }

        Ok(offset + layout.empty_len() + written)
    }
}
