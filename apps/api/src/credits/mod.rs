// Credit / subscription ledger: posting credits gate job activation.
// Consumption is a single conditional UPDATE; there is no read-then-write path.

pub mod alerts;
pub mod handlers;
pub mod ledger;
