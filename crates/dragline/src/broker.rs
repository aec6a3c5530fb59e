//! Delivery of synthetic drag notifications to drop targets.
//!
//! Drag sources never hold references to drop targets. They publish
//! enter/over/leave/drop against the element that was hit, and the broker
//! resolves it to the registered target on that element or, failing that, on
//! its nearest registered ancestor.

use std::collections::HashMap;

use dragline_core::UiDispatcher;
use dragline_core::logging::targets;
use slotmap::SlotMap;

use crate::channel::Channel;
use crate::drag::SourceId;
use crate::drop::{DRAG_OVER_CLASS, DropTarget, TargetId};
use crate::error::{DragDropError, Result};
use crate::events::Payload;
use crate::geometry::Point;
use crate::input::PointerInput;
use crate::viewport::{ElementId, Viewport};

/// A notification a drag source publishes to a drop element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyntheticEvent {
    Enter,
    Over,
    Leave,
    Drop,
}

/// What a drop target learns about the drag source.
#[derive(Debug, Clone)]
pub(crate) struct DragOwner {
    pub id: SourceId,
    pub element: ElementId,
    pub channel: Channel,
    pub data: Payload,
}

/// Gesture coordinates attached to a notification.
#[derive(Debug, Clone)]
pub(crate) struct DragDetails {
    pub original_event: PointerInput,
    pub start: Point,
    pub page: Point,
}

/// Registry of drop targets keyed by element.
#[derive(Debug, Default)]
pub(crate) struct DropBroker {
    targets: SlotMap<TargetId, DropTarget>,
    by_element: HashMap<ElementId, TargetId>,
}

impl DropBroker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a target and mark its element droppable.
    pub(crate) fn register(&mut self, target: DropTarget, viewport: &mut dyn Viewport) -> Result<TargetId> {
        let element = target.element();
        if self.by_element.contains_key(&element) {
            return Err(DragDropError::DuplicateTarget(element));
        }

        let id = self.targets.insert_with_key(|id| {
            let mut target = target;
            target.bind(id);
            target
        });
        self.by_element.insert(element, id);
        viewport.set_droppable(element, true);
        tracing::debug!(target: targets::DROP, ?id, ?element, "drop target registered");
        Ok(id)
    }

    pub(crate) fn unregister(&mut self, id: TargetId, viewport: &mut dyn Viewport) -> Result<DropTarget> {
        let target = self
            .targets
            .remove(id)
            .ok_or(DragDropError::UnknownTarget(id))?;
        self.by_element.remove(&target.element());
        viewport.set_droppable(target.element(), false);
        viewport.remove_class(target.element(), DRAG_OVER_CLASS);
        target.disconnect_all();
        tracing::debug!(target: targets::DROP, ?id, "drop target removed");
        Ok(target)
    }

    pub(crate) fn get(&self, id: TargetId) -> Option<&DropTarget> {
        self.targets.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: TargetId) -> Option<&mut DropTarget> {
        self.targets.get_mut(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.targets.len()
    }

    /// The target registered on `element` or its nearest ancestor.
    pub(crate) fn resolve(&self, element: ElementId, viewport: &dyn Viewport) -> Option<TargetId> {
        let mut current = Some(element);
        while let Some(el) = current {
            if let Some(&id) = self.by_element.get(&el) {
                return Some(id);
            }
            current = viewport.parent(el);
        }
        None
    }

    /// Deliver `event` to whatever target owns `element`.
    pub(crate) fn publish(
        &mut self,
        event: SyntheticEvent,
        element: ElementId,
        owner: &DragOwner,
        details: &DragDetails,
        viewport: &mut dyn Viewport,
        dispatcher: &dyn UiDispatcher,
    ) {
        let Some(id) = self.resolve(element, &*viewport) else {
            tracing::trace!(target: targets::DROP, ?event, ?element, "no drop target for element");
            return;
        };
        if let Some(target) = self.targets.get_mut(id) {
            target.handle(event, owner, details, viewport, dispatcher);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DropTargetConfig;
    use crate::geometry::{Rect, Size};
    use crate::scene::Scene;
    use dragline_core::DirectDispatcher;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn scene() -> Scene {
        Scene::new(Size::new(800.0, 600.0))
    }

    #[test]
    fn test_register_marks_droppable() {
        let mut scene = scene();
        let list = scene.add_element(scene.body(), "list", Rect::ZERO);
        let mut broker = DropBroker::new();

        let id = broker
            .register(DropTarget::new(list, DropTargetConfig::default()), &mut scene)
            .unwrap();
        assert!(scene.is_droppable(list));
        assert_eq!(broker.get(id).map(DropTarget::id), Some(id));

        assert!(matches!(
            broker.register(DropTarget::new(list, DropTargetConfig::default()), &mut scene),
            Err(DragDropError::DuplicateTarget(el)) if el == list
        ));

        broker.unregister(id, &mut scene).unwrap();
        assert!(!scene.is_droppable(list));
        assert_eq!(broker.len(), 0);
        assert!(matches!(
            broker.unregister(id, &mut scene),
            Err(DragDropError::UnknownTarget(_))
        ));
    }

    #[test]
    fn test_resolve_falls_back_to_ancestor() {
        let mut scene = scene();
        let list = scene.add_element(scene.body(), "list", Rect::ZERO);
        let row = scene.add_element(list, "row", Rect::ZERO);
        let label = scene.add_element(row, "label", Rect::ZERO);
        let outside = scene.add_element(scene.body(), "outside", Rect::ZERO);
        let mut broker = DropBroker::new();
        let id = broker
            .register(DropTarget::new(list, DropTargetConfig::default()), &mut scene)
            .unwrap();

        assert_eq!(broker.resolve(label, &scene), Some(id));
        assert_eq!(broker.resolve(list, &scene), Some(id));
        assert_eq!(broker.resolve(outside, &scene), None);
    }

    #[test]
    fn test_publish_reaches_target() {
        let mut scene = scene();
        let list = scene.add_element(scene.body(), "list", Rect::new(0.0, 0.0, 100.0, 100.0));
        let card = scene.add_element(scene.body(), "card", Rect::ZERO);
        let mut broker = DropBroker::new();
        let id = broker
            .register(DropTarget::new(list, DropTargetConfig::default()), &mut scene)
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        broker
            .get(id)
            .unwrap()
            .signals()
            .over
            .connect(move |args| sink.lock().push(args.owner));

        let owner = DragOwner {
            id: SourceId::default(),
            element: card,
            channel: Channel::Unset,
            data: Payload::empty(),
        };
        let details = DragDetails {
            original_event: PointerInput::pointer(1, Point::new(5.0, 5.0)),
            start: Point::ZERO,
            page: Point::new(5.0, 5.0),
        };
        broker.publish(SyntheticEvent::Over, list, &owner, &details, &mut scene, &DirectDispatcher);
        broker.publish(SyntheticEvent::Over, card, &owner, &details, &mut scene, &DirectDispatcher);

        assert_eq!(*seen.lock(), vec![id]);
    }
}
