pub mod upstream_stub;
