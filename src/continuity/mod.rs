pub(crate) mod grid;
pub(crate) mod line;
pub(crate) mod rule;
pub(crate) mod settings;
