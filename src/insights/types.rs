pub(crate) mod payload;
pub(crate) mod query;
pub(crate) mod result;
