mod content;
mod ids;
mod ledger;
mod question;

pub use content::{Catalog, CatalogError, ContentGroup, ContentItem};
pub use ids::{GroupId, ItemId, ItemKey, ParseItemKeyError, QuestionId};
pub use ledger::{ATTEMPT_BUDGET, ItemStatus, UnlockLedger};
pub use question::{QuestionDraft, QuestionError, QuestionPool, QuestionPoolError, QuestionRecord};
