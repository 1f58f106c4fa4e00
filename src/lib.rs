pub mod aggregate;
pub mod api;
pub mod editor;
pub mod excel;
pub mod format;
pub mod history;
pub mod storage;
pub mod types;

pub use editor::{default_quad, DragState, DrawCommand, QuadEditor, Surface, Viewport};
pub use excel::{export_history, export_history_to_file};
pub use history::{HistoryStore, MAX_HISTORY_ITEMS};
pub use storage::{MemoryStorage, SqliteStorage, Storage};
pub use types::{HistoryEntry, Point, Quad, ReceiptData, ReceiptDiscount, ReceiptItem};
