pub mod access_control;
pub mod file_service;
pub mod storage;
