//! pigpiod socket 客户端
//!
//! pigpiod 默认监听 TCP 8888。每条命令是 16 字节小端请求 `cmd, p1, p2, p3`，
//! 守护进程回 16 字节响应，最后 4 字节是有符号结果（负数为错误码）。
//!
//! 这里只实现舵机需要的两条命令：`SERVO`（设置脉宽）和 `GPW`（读取脉宽）。

use crate::{ActuatorDriver, DriverError};
use parking_lot::Mutex;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;
use tracing::{debug, info};

/// pigpiod 默认端口
pub const DEFAULT_PORT: u16 = 8888;

/// `set_servo_pulsewidth`
pub const CMD_SERVO: u32 = 8;

/// `get_servo_pulsewidth`
pub const CMD_GPW: u32 = 84;

/// 引脚当前不是舵机模式（从未写过或已断电）
const PI_NOT_SERVO_GPIO: i32 = -93;

const IO_TIMEOUT: Duration = Duration::from_secs(2);

/// 编码一条 pigpiod 请求
pub(crate) fn encode_request(cmd: u32, p1: u32, p2: u32) -> [u8; 16] {
    let mut buf = [0u8; 16];
    buf[0..4].copy_from_slice(&cmd.to_le_bytes());
    buf[4..8].copy_from_slice(&p1.to_le_bytes());
    buf[8..12].copy_from_slice(&p2.to_le_bytes());
    // p3 = 0（无扩展数据）
    buf
}

/// 解析响应中的结果字段
pub(crate) fn decode_result(resp: &[u8; 16]) -> i32 {
    i32::from_le_bytes([resp[12], resp[13], resp[14], resp[15]])
}

/// pigpiod 驱动
pub struct PigpioDriver {
    stream: Mutex<TcpStream>,
    addr: String,
}

impl PigpioDriver {
    /// 连接 pigpiod
    pub fn connect(host: &str, port: u16) -> Result<Self, DriverError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr)?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        stream.set_nodelay(true)?;
        info!("Connected to pigpiod at {}", addr);
        Ok(Self {
            stream: Mutex::new(stream),
            addr,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn command(&self, cmd: u32, p1: u32, p2: u32) -> Result<i32, DriverError> {
        let req = encode_request(cmd, p1, p2);
        let mut resp = [0u8; 16];
        {
            let mut stream = self.stream.lock();
            stream.write_all(&req)?;
            stream.read_exact(&mut resp)?;
        }
        Ok(decode_result(&resp))
    }
}

impl ActuatorDriver for PigpioDriver {
    fn set_pulse(&self, channel: u32, pulse_us: u32) -> Result<(), DriverError> {
        let res = self.command(CMD_SERVO, channel, pulse_us)?;
        if res < 0 {
            return Err(DriverError::Command {
                cmd: CMD_SERVO,
                code: res,
            });
        }
        Ok(())
    }

    fn get_pulse(&self, channel: u32) -> Result<u32, DriverError> {
        match self.command(CMD_GPW, channel, 0)? {
            PI_NOT_SERVO_GPIO => {
                debug!("GPIO {} is not in servo mode, treating as off", channel);
                Ok(0)
            },
            code if code < 0 => Err(DriverError::Command { cmd: CMD_GPW, code }),
            pulse => Ok(pulse as u32),
        }
    }
}

impl std::fmt::Debug for PigpioDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PigpioDriver").field("addr", &self.addr).finish()
    }
}
