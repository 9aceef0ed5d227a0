//! Native value transfer abstraction.

mod mock;
mod traits;

pub use mock::MockPaymentRail;
pub use traits::{PaymentError, PaymentId, PaymentRail};
