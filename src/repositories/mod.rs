//! Row codecs for the three tables. Each module owns its column layout.

pub(crate) mod exams;
pub(crate) mod submissions;
pub(crate) mod supports;
