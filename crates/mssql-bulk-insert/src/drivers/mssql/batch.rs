//! Batch boundaries for the TDS bulk request.
//!
//! The bulk request borrows the client, so a row that must go through a
//! single-row `INSERT` forces the open request to be finalized first.
//! [`BatchPlanner`] decides, row by row, what the sink does next.

/// Where the next cursor row goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowRoute {
    /// Open a bulk request and send the row on it.
    Open,
    /// Send the row on the open request.
    Append,
    /// Finalize the full request, open a new one and send the row on it.
    Rollover,
    /// Send the row through a single-row `INSERT`.
    Single {
        /// An open request has to be finalized before the insert.
        finalize_open: bool,
    },
}

#[derive(Debug)]
pub(crate) struct BatchPlanner {
    batch_limit: u64,
    in_batch: u64,
    committed: u64,
}

impl BatchPlanner {
    /// `None` keeps one request open for the whole transfer.
    pub(crate) fn new(batch_size: Option<usize>) -> Self {
        Self {
            batch_limit: batch_size.map_or(u64::MAX, |n| n.max(1) as u64),
            in_batch: 0,
            committed: 0,
        }
    }

    pub(crate) fn route(&mut self, oversized: bool) -> RowRoute {
        if oversized {
            let finalize_open = self.in_batch > 0;
            self.close_batch();
            return RowRoute::Single { finalize_open };
        }

        let route = if self.in_batch == 0 {
            RowRoute::Open
        } else if self.in_batch >= self.batch_limit {
            self.close_batch();
            RowRoute::Rollover
        } else {
            RowRoute::Append
        };
        self.in_batch += 1;
        route
    }

    /// Rows routed to bulk requests so far.
    pub(crate) fn bulk_rows(&self) -> u64 {
        self.committed + self.in_batch
    }

    fn close_batch(&mut self) {
        self.committed += self.in_batch;
        self.in_batch = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::RowRoute::*;

    /// Route a sequence of rows, `true` marking an oversized one.
    fn plan(rows: &[bool], batch_size: Option<usize>) -> (Vec<RowRoute>, BatchPlanner) {
        let mut planner = BatchPlanner::new(batch_size);
        let routes = rows.iter().map(|&oversized| planner.route(oversized)).collect();
        (routes, planner)
    }

    #[test]
    fn test_exactly_full_batch_stays_open() {
        let (routes, mut planner) = plan(&[false, false, false], Some(3));
        assert_eq!(routes, vec![Open, Append, Append]);
        assert_eq!(planner.bulk_rows(), 3);
        assert_eq!(
            planner.route(true),
            Single {
                finalize_open: true
            }
        );
    }

    #[test]
    fn test_one_past_batch_size_rolls_over() {
        let (routes, planner) = plan(&[false, false, false, false], Some(3));
        assert_eq!(routes, vec![Open, Append, Append, Rollover]);
        assert_eq!(planner.bulk_rows(), 4);
    }

    #[test]
    fn test_batch_of_one() {
        let (routes, _) = plan(&[false, false, false], Some(1));
        assert_eq!(routes, vec![Open, Rollover, Rollover]);
    }

    #[test]
    fn test_unbounded_batch_never_rolls_over() {
        let (routes, planner) = plan(&[false; 5], None);
        assert_eq!(routes, vec![Open, Append, Append, Append, Append]);
        assert_eq!(planner.bulk_rows(), 5);
    }

    #[test]
    fn test_oversized_first_row_goes_singly() {
        let (routes, planner) = plan(&[true, false, false], Some(10));
        assert_eq!(
            routes,
            vec![Single { finalize_open: false }, Open, Append]
        );
        assert_eq!(planner.bulk_rows(), 2);
    }

    #[test]
    fn test_oversized_row_mid_batch_splits_it() {
        let (routes, planner) = plan(&[false, false, true, false], Some(10));
        assert_eq!(
            routes,
            vec![Open, Append, Single { finalize_open: true }, Open]
        );
        assert_eq!(planner.bulk_rows(), 3);
    }

    #[test]
    fn test_consecutive_oversized_rows() {
        let (routes, planner) = plan(&[false, true, true], Some(10));
        assert_eq!(
            routes,
            vec![
                Open,
                Single { finalize_open: true },
                Single { finalize_open: false },
            ]
        );
        assert_eq!(planner.bulk_rows(), 1);
    }

    #[test]
    fn test_only_row_oversized() {
        let (routes, mut planner) = plan(&[true], Some(10));
        assert_eq!(routes, vec![Single { finalize_open: false }]);
        assert_eq!(planner.bulk_rows(), 0);
        assert_eq!(planner.route(false), Open);
    }

    #[test]
    fn test_oversized_row_resets_batch_count() {
        let (routes, _) = plan(&[false, false, true, false, false, false], Some(2));
        assert_eq!(
            routes,
            vec![
                Open,
                Append,
                Single { finalize_open: true },
                Open,
                Append,
                Rollover,
            ]
        );
    }

    #[test]
    fn test_empty_cursor() {
        let (routes, planner) = plan(&[], Some(3));
        assert!(routes.is_empty());
        assert_eq!(planner.bulk_rows(), 0);
    }
}
