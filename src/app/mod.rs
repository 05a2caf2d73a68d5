// Application layer: how results leave the process (console, files, charts).

pub mod presenter;
