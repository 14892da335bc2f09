//! Request handlers, one submodule per resource.

pub mod leads;
