//! 执行器模块测试
