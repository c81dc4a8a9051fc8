//! 游标订阅句柄

use std::rc::Rc;

use tabletop_model::{ListenerId, TimelineStore};
use tracing::debug;

/// 游标订阅
///
/// 析构时只注销监听，不会取消已经开始的动画；
/// 因此重新订阅（例如宿主重建界面）不会打断正在播放的事件。
pub struct CursorSubscription {
    timeline: Rc<dyn TimelineStore>,
    id: ListenerId,
}

impl CursorSubscription {
    pub(super) fn new(timeline: Rc<dyn TimelineStore>, id: ListenerId) -> Self {
        Self { timeline, id }
    }

    /// 监听者 ID
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl std::fmt::Debug for CursorSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorSubscription")
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for CursorSubscription {
    fn drop(&mut self) {
        self.timeline.unsubscribe(self.id);
        debug!(listener = ?self.id, "已注销游标监听");
    }
}
