//! 移动例程

use tabletop_model::{Action, MoveData};
use tracing::{debug, trace};

use super::Inner;
use crate::error::PlaybackError;
use crate::scene::NodeId;

impl Inner {
    /// 从节点的实时位置移动到目标位置
    ///
    /// 每帧同时写入场景节点与对象存储，结束时精确落在目标点。
    pub(super) async fn animate_move(
        &self,
        action: &Action,
        data: &MoveData,
        node: NodeId,
    ) -> Result<(), PlaybackError> {
        let Some(start) = self.scene.position(node) else {
            debug!(token = %action.token_id, "节点已失效，跳过移动");
            return Ok(());
        };
        let target = data.to_position;
        let token = action.token_id.as_str();
        let duration = data.duration / self.speed();

        debug!(token = %token, from = %start, to = %target, duration, "开始移动");
        self.progress.start_animation(token, start, target);

        self.run_tween(duration, data.easing.into(), |sample| {
            let position = if sample.finished {
                target
            } else {
                start.lerp(target, sample.eased)
            };
            trace!(token = %token, progress = sample.raw, "移动帧");
            self.scene.set_position(node, position);
            self.store.update_object_position(token, position);
            self.progress.update_progress(token, sample.raw);
        })
        .await?;

        self.progress.end_animation(token);
        debug!(token = %token, "移动完成");
        Ok(())
    }
}
