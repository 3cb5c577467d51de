//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（Clock から timestamp 部分を取る）

use ulid::Ulid;

use crate::domain::ids::CommandId;
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_command_id(&self) -> CommandId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// FixedClock を渡すと timestamp 部分が固定される（ランダム部分は毎回変わる）。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_command_id(&self) -> CommandId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        CommandId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
