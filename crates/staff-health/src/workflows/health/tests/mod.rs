mod common;

mod completion;
