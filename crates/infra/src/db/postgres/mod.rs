pub mod postgres_connection;
