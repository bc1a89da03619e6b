pub mod adapter;
pub mod bridge;

#[cfg(test)]
pub(crate) mod testing;
