//! Drop targets.
//!
//! A drop target reacts to the synthetic enter/over/leave/drop notifications
//! a drag source publishes through the [`DropBroker`](crate::broker::DropBroker).
//! Notifications from a source whose channel is not linked to the target's are
//! ignored. An uncanceled drop applies the target's [`DropStrategy`].

use dragline_core::logging::targets;
use dragline_core::{Signal, UiDispatcher, emit_with};
use slotmap::new_key_type;

use crate::broker::{DragDetails, DragOwner, SyntheticEvent};
use crate::channel::Channel;
use crate::config::DropTargetConfig;
use crate::events::{DropDroppedEventArgs, DropEventArgs, Payload};
use crate::hit_test::elements_at_point;
use crate::strategy::DropStrategy;
use crate::transform::page_position;
use crate::viewport::{ElementId, Viewport};

new_key_type! {
    /// Identifies a drop target registered with a manager.
    pub struct TargetId;
}

/// Class present on a target while a linked drag hovers it.
pub const DRAG_OVER_CLASS: &str = "drag-over";

/// Signals emitted by a drop target.
#[derive(Debug, Default)]
pub struct DropSignals {
    /// A linked drag moved onto the target.
    pub enter: Signal<DropEventArgs>,
    /// A linked drag moved within the target.
    pub over: Signal<DropEventArgs>,
    /// A linked drag moved off the target or was released over it.
    pub leave: Signal<DropEventArgs>,
    /// A linked drag was released over the target. Setting `cancel`
    /// skips the drop strategy.
    pub dropped: Signal<DropDroppedEventArgs>,
}

/// An element that accepts drags.
#[derive(Debug)]
pub struct DropTarget {
    id: TargetId,
    element: ElementId,
    config: DropTargetConfig,
    data: Payload,
    hovered: bool,
    signals: DropSignals,
}

impl DropTarget {
    pub fn new(element: ElementId, config: DropTargetConfig) -> Self {
        Self {
            id: TargetId::default(),
            element,
            config,
            data: Payload::empty(),
            hovered: false,
            signals: DropSignals::default(),
        }
    }

    /// Attach a payload to the target.
    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = data;
        self
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub(crate) fn bind(&mut self, id: TargetId) {
        self.id = id;
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn channel(&self) -> &Channel {
        &self.config.channel
    }

    pub fn strategy(&self) -> DropStrategy {
        self.config.strategy
    }

    pub fn set_strategy(&mut self, strategy: DropStrategy) {
        self.config.strategy = strategy;
    }

    pub fn data(&self) -> &Payload {
        &self.data
    }

    /// Whether a linked drag is currently over the target.
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn signals(&self) -> &DropSignals {
        &self.signals
    }

    /// Handle one synthetic notification from a drag source.
    pub(crate) fn handle(
        &mut self,
        event: SyntheticEvent,
        owner: &DragOwner,
        details: &DragDetails,
        viewport: &mut dyn Viewport,
        dispatcher: &dyn UiDispatcher,
    ) {
        if !owner.channel.is_linked(&self.config.channel) {
            tracing::trace!(target: targets::DROP, ?event, target_id = ?self.id, "drag not linked, ignoring");
            return;
        }

        let mut args = DropEventArgs {
            original_event: details.original_event.clone(),
            owner: self.id,
            drag: owner.id,
            drag_data: owner.data.clone(),
            start: details.start,
            page: details.page,
            offset: details.page - page_position(&*viewport, self.element),
        };

        tracing::trace!(target: targets::DROP, ?event, target_id = ?self.id, drag = ?owner.id, "drop target notified");
        match event {
            SyntheticEvent::Enter => {
                self.hovered = true;
                viewport.add_class(self.element, DRAG_OVER_CLASS);
                emit_with(dispatcher, &self.signals.enter, &mut args);
            }
            SyntheticEvent::Over => {
                emit_with(dispatcher, &self.signals.over, &mut args);
            }
            SyntheticEvent::Leave => {
                self.hovered = false;
                viewport.remove_class(self.element, DRAG_OVER_CLASS);
                emit_with(dispatcher, &self.signals.leave, &mut args);
            }
            SyntheticEvent::Drop => self.accept_drop(owner, args, viewport, dispatcher),
        }
    }

    fn accept_drop(
        &mut self,
        owner: &DragOwner,
        args: DropEventArgs,
        viewport: &mut dyn Viewport,
        dispatcher: &dyn UiDispatcher,
    ) {
        let page = args.page;
        let mut dropped = DropDroppedEventArgs {
            base: args,
            cancel: false,
        };
        emit_with(dispatcher, &self.signals.dropped, &mut dropped);
        if dropped.cancel {
            tracing::debug!(target: targets::DROP, target_id = ?self.id, "drop canceled");
            return;
        }

        let stack = elements_at_point(&*viewport, page);
        let index = insert_index(&*viewport, self.element, owner.element, &stack);
        tracing::debug!(
            target: targets::DROP,
            target_id = ?self.id,
            strategy = ?self.config.strategy,
            ?index,
            "applying drop strategy"
        );
        self.config
            .strategy
            .apply(viewport, owner.element, self.element, index);
    }

    pub(crate) fn disconnect_all(&self) {
        self.signals.enter.disconnect_all();
        self.signals.over.disconnect_all();
        self.signals.leave.disconnect_all();
        self.signals.dropped.disconnect_all();
    }
}

/// Where a dropped element should be inserted among `target`'s children.
///
/// Uses the topmost direct child of `target` in `stack`. When the dragged
/// element is itself an earlier child, the index is shifted by one so that
/// it lands after the child under the pointer. `None` when the target is
/// empty or no child is under the pointer.
pub fn insert_index<V: Viewport + ?Sized>(
    viewport: &V,
    target: ElementId,
    dragged: ElementId,
    stack: &[ElementId],
) -> Option<usize> {
    let children = viewport.children(target);
    if children.is_empty() {
        return None;
    }

    let under = stack
        .iter()
        .copied()
        .find(|&element| viewport.parent(element) == Some(target))?;
    let index = children.iter().position(|&child| child == under)?;

    match children.iter().position(|&child| child == dragged) {
        Some(dragged_index) if dragged_index < index => Some(index + 1),
        _ => Some(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::SourceId;
    use crate::geometry::{Point, Rect, Size};
    use crate::input::PointerInput;
    use crate::scene::Scene;
    use dragline_core::DirectDispatcher;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Fixture {
        scene: Scene,
        list: ElementId,
        rows: Vec<ElementId>,
    }

    /// A list at (0,0) with four 40px rows.
    fn fixture() -> Fixture {
        let mut scene = Scene::new(Size::new(800.0, 600.0));
        let list = scene.add_element(scene.body(), "list", Rect::new(0.0, 0.0, 200.0, 160.0));
        let rows = (0..4)
            .map(|i| {
                let y = f64::from(i) * 40.0;
                scene.add_element(list, &format!("row-{i}"), Rect::new(0.0, y, 200.0, 40.0))
            })
            .collect();
        Fixture { scene, list, rows }
    }

    fn owner(element: ElementId, channel: Channel) -> DragOwner {
        DragOwner {
            id: SourceId::default(),
            element,
            channel,
            data: Payload::new("row"),
        }
    }

    fn details(page: Point) -> DragDetails {
        DragDetails {
            original_event: PointerInput::pointer(1, page),
            start: Point::ZERO,
            page,
        }
    }

    #[test]
    fn test_insert_index_after_earlier_sibling() {
        let f = fixture();
        let stack = elements_at_point(&f.scene, Point::new(10.0, 90.0));
        // Pointer over row-2; row-0 is being dragged from earlier in the list.
        assert_eq!(insert_index(&f.scene, f.list, f.rows[0], &stack), Some(3));
        assert_eq!(insert_index(&f.scene, f.list, f.rows[3], &stack), Some(2));
    }

    #[test]
    fn test_insert_index_without_child_under_pointer() {
        let mut f = fixture();
        let stack = elements_at_point(&f.scene, Point::new(500.0, 500.0));
        assert_eq!(insert_index(&f.scene, f.list, f.rows[0], &stack), None);

        let empty = f.scene.add_element(f.scene.body(), "empty", Rect::new(300.0, 0.0, 100.0, 100.0));
        let stack = elements_at_point(&f.scene, Point::new(310.0, 10.0));
        assert_eq!(insert_index(&f.scene, empty, f.rows[0], &stack), None);
    }

    #[test]
    fn test_enter_leave_toggle_hover_class() {
        let mut f = fixture();
        let mut target = DropTarget::new(f.list, DropTargetConfig::default());
        let entered = Arc::new(Mutex::new(Vec::new()));
        let sink = entered.clone();
        target.signals().enter.connect(move |args| sink.lock().push(args.offset));

        let dragged = f.scene.add_element(f.scene.body(), "card", Rect::ZERO);
        let owner = owner(dragged, Channel::Unset);
        target.handle(SyntheticEvent::Enter, &owner, &details(Point::new(15.0, 25.0)), &mut f.scene, &DirectDispatcher);

        assert!(target.is_hovered());
        assert!(f.scene.has_class(f.list, DRAG_OVER_CLASS));
        assert_eq!(*entered.lock(), vec![Point::new(15.0, 25.0)]);

        target.handle(SyntheticEvent::Leave, &owner, &details(Point::new(15.0, 25.0)), &mut f.scene, &DirectDispatcher);
        assert!(!target.is_hovered());
        assert!(!f.scene.has_class(f.list, DRAG_OVER_CLASS));
    }

    #[test]
    fn test_unlinked_drag_is_ignored() {
        let mut f = fixture();
        let config = DropTargetConfig::default().with_channel(Channel::one("rows"));
        let mut target = DropTarget::new(f.list, config);
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        target.signals().over.connect(move |_| *sink.lock() += 1);

        let dragged = f.scene.add_element(f.scene.body(), "card", Rect::ZERO);
        let owner = owner(dragged, Channel::one("columns"));
        for event in [SyntheticEvent::Enter, SyntheticEvent::Over] {
            target.handle(event, &owner, &details(Point::new(5.0, 5.0)), &mut f.scene, &DirectDispatcher);
        }

        assert!(!target.is_hovered());
        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_drop_applies_strategy_unless_canceled() {
        let mut f = fixture();
        let config = DropTargetConfig::default().with_strategy(DropStrategy::Append);
        let mut target = DropTarget::new(f.list, config);
        let other = f.scene.add_element(f.scene.body(), "other", Rect::new(400.0, 0.0, 100.0, 100.0));
        let dragged = f.scene.add_element(other, "card", Rect::new(400.0, 0.0, 50.0, 50.0));
        let owner = owner(dragged, Channel::Unset);

        let veto = target.signals().dropped.connect(|args| args.cancel = true);
        target.handle(SyntheticEvent::Drop, &owner, &details(Point::new(10.0, 10.0)), &mut f.scene, &DirectDispatcher);
        assert_eq!(f.scene.parent(dragged), Some(other));

        target.signals().dropped.disconnect(veto);
        let data = Arc::new(Mutex::new(None));
        let sink = data.clone();
        target
            .signals()
            .dropped
            .connect(move |args| *sink.lock() = args.base.drag_data.get::<&str>().copied());
        target.handle(SyntheticEvent::Drop, &owner, &details(Point::new(10.0, 10.0)), &mut f.scene, &DirectDispatcher);
        assert_eq!(f.scene.children(f.list).last(), Some(&dragged));
        assert_eq!(*data.lock(), Some("row"));
    }
}
