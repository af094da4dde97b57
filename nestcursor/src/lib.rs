pub mod error;

pub mod config;
pub mod mapping;

pub mod cursor;
pub use cursor::{Cursor, CursorIter, CursorState};

pub mod exec {
    pub mod aggregator;

    pub mod window;
}

pub mod row {
    pub mod value;

    pub mod values;

    pub mod object;
}

pub mod source;

mod util {
    pub mod macros;
}
