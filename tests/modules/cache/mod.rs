//! 缓存模块测试

mod integration;
