mod cursor;
mod memory;
mod preferences;
mod schema;
mod store;
mod types;

pub use cursor::{ReadCursor, ReadCursorStore, READ_CURSOR_KEY};
pub use memory::MemoryStore;
pub use schema::Database;
pub use store::PreferenceStore;
pub use types::{DatabaseError, StoreError};
