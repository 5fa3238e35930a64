/// 远端调用失败。
///
/// 传输错误、非 2xx 状态、非结构化响应、不合规的负载都归为这一种错误：
/// 调用方的处理方式相同 (降级)，变体只保留细节用于日志。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned http status {0}")]
    Status(u16),

    #[error("backend response is not structured data (content-type: {0})")]
    NotStructured(String),

    #[error("malformed backend payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
