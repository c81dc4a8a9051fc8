//! 出现/消失例程

use tabletop_model::{Action, AppearData, DisappearData};
use tracing::debug;

use super::Inner;
use crate::animation::EasingFunction;
use crate::error::PlaybackError;
use crate::scene::NodeId;

impl Inner {
    fn write_opacity(&self, node: NodeId, token: &str, opacity: f32) {
        self.scene.set_opacity(node, opacity);
        self.store.update_object_opacity(token, opacity);
    }

    /// 出现：先同步隐藏并放到目标位置，再淡入到对象的常规透明度
    pub(super) async fn animate_appear(
        &self,
        action: &Action,
        data: &AppearData,
        node: NodeId,
    ) -> Result<(), PlaybackError> {
        let token = action.token_id.as_str();
        let target = self
            .store
            .object(token)
            .map(|object| object.resting_opacity())
            .unwrap_or(1.0);

        // 必须在第一帧之前完成，避免在旧位置闪现
        self.write_opacity(node, token, 0.0);
        self.scene.set_position(node, data.position);
        self.store.update_object_position(token, data.position);

        if !data.fade_in {
            self.write_opacity(node, token, target);
            debug!(token = %token, opacity = target, "立即出现");
            return Ok(());
        }

        let duration = data.duration / self.speed();
        debug!(token = %token, opacity = target, duration, "开始淡入");
        self.run_tween(duration, EasingFunction::Linear, |sample| {
            self.write_opacity(node, token, sample.lerp(0.0, target));
        })
        .await?;

        debug!(token = %token, "淡入完成");
        Ok(())
    }

    /// 消失：从当前透明度淡出到 0，不删除对象
    pub(super) async fn animate_disappear(
        &self,
        action: &Action,
        data: &DisappearData,
        node: NodeId,
    ) -> Result<(), PlaybackError> {
        let token = action.token_id.as_str();

        if !data.fade_out {
            self.write_opacity(node, token, 0.0);
            debug!(token = %token, "立即消失");
            return Ok(());
        }

        let from = self.scene.opacity(node).unwrap_or(1.0);
        let duration = data.duration / self.speed();
        debug!(token = %token, from, duration, "开始淡出");
        self.run_tween(duration, EasingFunction::Linear, |sample| {
            self.write_opacity(node, token, sample.lerp(from, 0.0));
        })
        .await?;

        debug!(token = %token, "淡出完成");
        Ok(())
    }
}
