pub mod sync;
pub mod test_connection;
