pub mod http_handler;
