//! Drag sources and the pointer gesture state machine.
//!
//! A [`DragSource`] turns a stream of pointer input into a drag:
//!
//! ```text
//!  Idle ──press──▶ Pressed ──move past tolerance──▶ Dragging ──release──▶ Idle
//!                     │                                │
//!                     └──release──▶ Idle (click)       └──release while animating──▶ Returning ──transition end──▶ Idle
//! ```
//!
//! While dragging, the source either floats a ghost proxy (the default) or
//! translates the element itself, keeps the window or its scroll container
//! scrolling near the edges, and publishes enter/over/leave/drop to the drop
//! targets under the pointer.
//!
//! Sources are driven by a [`DragDropManager`](crate::DragDropManager), which
//! owns the viewport, the timers and the drop targets. Slots connected to a
//! source's signals cannot reach the manager; they request programmatic moves
//! through [`DragCommands`] instead, which the source runs as soon as the
//! current emission has finished.

use std::sync::Arc;
use std::time::Duration;

use dragline_core::logging::{span_names, targets};
use dragline_core::{PerfSpan, Signal, TimerId, TimerManager, UiDispatcher, emit_with};
use parking_lot::Mutex;
use slotmap::new_key_type;

use crate::animation::{TransitionArgs, arm_transition, disarm_transition};
use crate::autoscroll::{ScrollDirection, ScrollLoop, detect_direction};
use crate::broker::{DragDetails, DragOwner, DropBroker, SyntheticEvent};
use crate::config::{DragAxis, DragSourceConfig};
use crate::events::{DragBaseEventArgs, DragMoveEventArgs, DragStartEventArgs, GhostEventArgs, Payload};
use crate::geometry::{DragLocation, Point};
use crate::ghost::{Ghost, GhostRequest};
use crate::hit_test::{elements_at_point, find_drop_target};
use crate::input::{InputKind, PointerInput};
use crate::transform::{origin_position, page_position, set_translation, translation};
use crate::viewport::{ElementId, Viewport};

new_key_type! {
    /// Identifies a drag source registered with a manager.
    pub struct SourceId;
}

/// Class added to every registered drag source.
pub const DRAG_CLASS: &str = "dragline-drag";

/// Class added to drag sources without handles, whose whole surface grabs.
pub const SELECT_DISABLED_CLASS: &str = "dragline-drag--select-disabled";

/// Where a drag source is in its gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pressed, but the pointer has not moved past the tolerance.
    Pressed,
    Dragging,
    /// Released or repositioned, waiting for the transition to finish.
    Returning,
}

/// Signals emitted by a drag source.
#[derive(Debug, Default)]
pub struct DragSignals {
    /// The pointer crossed the tolerance. Cancelable.
    pub drag_start: Signal<DragStartEventArgs>,
    /// The drag moved. Cancelable; slots may rewrite `next`.
    pub drag_move: Signal<DragMoveEventArgs>,
    pub drag_end: Signal<DragBaseEventArgs>,
    /// Released without ever crossing the tolerance.
    pub drag_click: Signal<DragBaseEventArgs>,
    /// A ghost is about to enter the tree. Cancelable.
    pub ghost_create: Signal<GhostEventArgs>,
    /// A ghost is about to be removed. Cancelable.
    pub ghost_destroy: Signal<GhostEventArgs>,
    /// The drag (and any transition after it) has fully finished.
    pub transitioned: Signal<DragBaseEventArgs>,
}

impl DragSignals {
    fn disconnect_all(&self) {
        self.drag_start.disconnect_all();
        self.drag_move.disconnect_all();
        self.drag_end.disconnect_all();
        self.drag_click.disconnect_all();
        self.ghost_create.disconnect_all();
        self.ghost_destroy.disconnect_all();
        self.transitioned.disconnect_all();
    }
}

/// Where a programmatic transition ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionTarget {
    /// A page location for the dragged element's (or ghost's) top-left.
    Location(DragLocation),
    /// The top-left corner of another element.
    Element(ElementId),
}

impl From<DragLocation> for TransitionTarget {
    fn from(location: DragLocation) -> Self {
        Self::Location(location)
    }
}

impl From<ElementId> for TransitionTarget {
    fn from(element: ElementId) -> Self {
        Self::Element(element)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragCommand {
    SetLocation(DragLocation),
    TransitionTo {
        target: TransitionTarget,
        args: TransitionArgs,
        start: Option<DragLocation>,
    },
    TransitionToOrigin {
        args: TransitionArgs,
        start: Option<DragLocation>,
    },
}

/// A cloneable handle for repositioning a drag source from inside a slot.
///
/// Requests are queued and run by the source once the emission that queued
/// them has returned, e.g. a `drag_end` slot asking for a return to origin
/// is honored before the source decides whether it is still animating.
#[derive(Debug, Clone, Default)]
pub struct DragCommands {
    queue: Arc<Mutex<Vec<DragCommand>>>,
}

impl DragCommands {
    pub fn set_location(&self, location: DragLocation) {
        self.queue.lock().push(DragCommand::SetLocation(location));
    }

    pub fn transition_to(
        &self,
        target: impl Into<TransitionTarget>,
        args: TransitionArgs,
        start: Option<DragLocation>,
    ) {
        self.queue.lock().push(DragCommand::TransitionTo {
            target: target.into(),
            args,
            start,
        });
    }

    pub fn transition_to_origin(&self, args: TransitionArgs, start: Option<DragLocation>) {
        self.queue
            .lock()
            .push(DragCommand::TransitionToOrigin { args, start });
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    fn take(&self) -> Vec<DragCommand> {
        std::mem::take(&mut *self.queue.lock())
    }
}

/// The visible half of a programmatic transition, run on a zero-delay timer.
#[derive(Debug, Clone, Copy)]
enum Deferred {
    To(TransitionTarget, TransitionArgs),
    ToOrigin(TransitionArgs),
}

/// Everything a drag source touches outside itself.
pub(crate) struct DragContext<'a> {
    pub viewport: &'a mut dyn Viewport,
    pub timers: &'a mut TimerManager,
    pub broker: &'a mut DropBroker,
    pub dispatcher: &'a dyn UiDispatcher,
}

impl DragContext<'_> {
    fn publish(&mut self, event: SyntheticEvent, element: ElementId, owner: &DragOwner, details: &DragDetails) {
        self.broker
            .publish(event, element, owner, details, &mut *self.viewport, self.dispatcher);
    }
}

/// A draggable element.
#[derive(Debug)]
pub struct DragSource {
    id: SourceId,
    element: ElementId,
    config: DragSourceConfig,
    data: Payload,
    handles: Vec<ElementId>,
    ignored: Vec<ElementId>,
    ghost_template: Option<ElementId>,
    ghost_host: Option<ElementId>,
    scroll_container: Option<ElementId>,
    signals: DragSignals,
    commands: DragCommands,

    pointer_id: Option<i32>,
    pressed: bool,
    /// The start event of the current gesture was vetoed.
    aborted: bool,
    drag_started: bool,
    anim_in_progress: bool,
    /// Set after a processed move until the next frame.
    throttled: bool,
    /// Page coordinates of the press.
    start: Point,
    /// Page coordinates after the last processed move.
    last: Point,
    /// Element top-left minus the press point.
    default_offset: Point,
    /// Ghost top-left at the press, in page space.
    ghost_start: Point,
    ghost: Option<Ghost>,
    last_drop: Option<ElementId>,
    scroll: Option<ScrollLoop>,
    deferred: Option<(TimerId, Deferred)>,
    detached: bool,
}

impl DragSource {
    pub fn new(element: ElementId, config: DragSourceConfig) -> Self {
        Self {
            id: SourceId::default(),
            element,
            config,
            data: Payload::empty(),
            handles: Vec::new(),
            ignored: Vec::new(),
            ghost_template: None,
            ghost_host: None,
            scroll_container: None,
            signals: DragSignals::default(),
            commands: DragCommands::default(),
            pointer_id: None,
            pressed: false,
            aborted: false,
            drag_started: false,
            anim_in_progress: false,
            throttled: false,
            start: Point::ZERO,
            last: Point::ZERO,
            default_offset: Point::ZERO,
            ghost_start: Point::ZERO,
            ghost: None,
            last_drop: None,
            scroll: None,
            deferred: None,
            detached: false,
        }
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Attach the payload drop targets receive as `drag_data`.
    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = data;
        self
    }

    /// Only presses on these elements start a drag.
    pub fn with_handles(mut self, handles: impl IntoIterator<Item = ElementId>) -> Self {
        self.handles = handles.into_iter().collect();
        self
    }

    /// Presses whose target is exactly one of these elements are ignored.
    pub fn with_ignored(mut self, ignored: impl IntoIterator<Item = ElementId>) -> Self {
        self.ignored = ignored.into_iter().collect();
        self
    }

    /// Build ghosts from this template instead of cloning the element.
    pub fn with_ghost_template(mut self, template: ElementId) -> Self {
        self.ghost_template = Some(template);
        self
    }

    /// Insert ghosts under this element instead of the document body.
    pub fn with_ghost_host(mut self, host: ElementId) -> Self {
        self.ghost_host = Some(host);
        self
    }

    /// Auto-scroll this element instead of the window.
    pub fn with_scroll_container(mut self, container: ElementId) -> Self {
        self.scroll_container = Some(container);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn config(&self) -> &DragSourceConfig {
        &self.config
    }

    pub fn data(&self) -> &Payload {
        &self.data
    }

    pub fn handles(&self) -> &[ElementId] {
        &self.handles
    }

    pub fn signals(&self) -> &DragSignals {
        &self.signals
    }

    /// A handle slots can capture to reposition this source.
    pub fn commands(&self) -> DragCommands {
        self.commands.clone()
    }

    pub fn state(&self) -> DragState {
        if self.anim_in_progress {
            DragState::Returning
        } else if self.pressed && self.drag_started {
            DragState::Dragging
        } else if self.pressed {
            DragState::Pressed
        } else if self.drag_started {
            DragState::Returning
        } else {
            DragState::Idle
        }
    }

    /// The live ghost element, if any.
    pub fn ghost_element(&self) -> Option<ElementId> {
        self.ghost.map(|ghost| ghost.element())
    }

    /// The drop element currently hovered.
    pub fn hovered_drop_element(&self) -> Option<ElementId> {
        self.last_drop
    }

    /// Direction of the running edge-scroll loop.
    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.scroll.map(|scroll| scroll.direction)
    }

    /// Current top-left of the ghost (or the element) in page space.
    pub fn location(&self, viewport: &dyn Viewport) -> DragLocation {
        self.current_location(viewport).into()
    }

    /// Page top-left of the element with its translation removed.
    pub fn origin_location(&self, viewport: &dyn Viewport) -> DragLocation {
        origin_position(viewport, self.element).into()
    }

    fn current_location(&self, viewport: &dyn Viewport) -> Point {
        match self.ghost {
            Some(ghost) if self.config.ghost => ghost.page_position(viewport),
            _ => page_position(viewport, self.element),
        }
    }

    fn ghost_offset(&self) -> Point {
        Point::new(
            self.config.ghost_offset_x.unwrap_or(self.default_offset.x),
            self.config.ghost_offset_y.unwrap_or(self.default_offset.y),
        )
    }

    fn owner(&self) -> DragOwner {
        DragOwner {
            id: self.id,
            element: self.element,
            channel: self.config.channel.clone(),
            data: self.data.clone(),
        }
    }

    fn base_args(&self, original_event: Option<PointerInput>, page: Point) -> DragBaseEventArgs {
        DragBaseEventArgs {
            original_event,
            owner: self.id,
            start: self.start,
            page,
        }
    }

    // =========================================================================
    // Registration and routing
    // =========================================================================

    pub(crate) fn attach(&mut self, id: SourceId, viewport: &mut dyn Viewport) {
        self.id = id;
        viewport.add_class(self.element, DRAG_CLASS);
        if self.handles.is_empty() {
            viewport.add_class(self.element, SELECT_DISABLED_CLASS);
        }
        viewport.set_style(self.element, "transition-duration", "0s");
    }

    /// Whether press, move and release input on `element` belongs to this source.
    pub(crate) fn listens_on(&self, element: ElementId) -> bool {
        self.grabs_on(element) || self.ghost_element() == Some(element)
    }

    pub(crate) fn grabs_on(&self, element: ElementId) -> bool {
        if self.handles.is_empty() {
            element == self.element
        } else {
            self.handles.contains(&element)
        }
    }

    /// Whether a lost pointer capture on `element` ends this source's gesture.
    ///
    /// In ghost mode only the ghost holds the capture that matters.
    pub(crate) fn receives_lost_capture(&self, element: ElementId) -> bool {
        (!self.config.ghost && self.grabs_on(element)) || self.ghost_element() == Some(element)
    }

    pub(crate) fn owns_timer(&self, timer: TimerId) -> bool {
        self.scroll.is_some_and(|scroll| scroll.timer == timer)
            || self.deferred.is_some_and(|(deferred, _)| deferred == timer)
    }

    pub(crate) fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub(crate) fn end_frame(&mut self) {
        self.throttled = false;
    }

    // =========================================================================
    // Pointer input
    // =========================================================================

    pub(crate) fn pointer_down(&mut self, input: &mut PointerInput, ctx: &mut DragContext<'_>) {
        if self.detached {
            return;
        }
        if let Some(target) = input.target
            && self.ignored.contains(&target)
        {
            tracing::trace!(target: targets::DRAG, source = ?self.id, "press on ignored element");
            return;
        }

        self.pressed = true;
        self.aborted = false;
        self.throttled = false;
        self.pointer_id = input.pointer_id;

        let grabbed = input
            .current_target
            .filter(|el| self.handles.contains(el))
            .unwrap_or(self.element);
        let captured = match (input.kind, input.pointer_id) {
            (InputKind::Pointer, Some(pointer_id)) => ctx.viewport.set_pointer_capture(grabbed, pointer_id),
            _ => false,
        };
        if !captured {
            ctx.viewport.focus(grabbed);
            input.prevent_default();
        }

        self.start = input.page;
        self.last = self.start;
        self.default_offset = page_position(&*ctx.viewport, self.element) - self.start;
        self.ghost_start = self.start + self.ghost_offset();

        tracing::debug!(
            target: targets::DRAG,
            source = ?self.id,
            x = self.start.x,
            y = self.start.y,
            captured,
            "pointer pressed"
        );
    }

    #[tracing::instrument(skip_all, target = "dragline::drag", level = "trace", fields(source = ?self.id))]
    pub(crate) fn pointer_move(&mut self, input: &mut PointerInput, ctx: &mut DragContext<'_>) {
        if !self.pressed || self.aborted || self.detached {
            return;
        }
        if self.throttled {
            tracing::trace!(target: targets::DRAG, "move throttled until next frame");
            return;
        }
        self.throttled = true;

        let page = input.page;
        if input.is_touch() {
            input.prevent_default();
        }

        let moved = page - self.start;
        if !self.drag_started {
            let axis = self.config.axis;
            let tolerance = self.config.tolerance;
            let exceeded = (axis.allows_x() && moved.x.abs() > tolerance)
                || (axis.allows_y() && moved.y.abs() > tolerance);
            if !exceeded {
                return;
            }

            let mut args = DragStartEventArgs {
                original_event: input.clone(),
                owner: self.id,
                start: page - moved,
                page,
                cancel: false,
            };
            emit_with(ctx.dispatcher, &self.signals.drag_start, &mut args);
            if args.cancel {
                tracing::debug!(target: targets::DRAG, source = ?self.id, "drag start vetoed");
                self.aborted = true;
                return;
            }

            self.drag_started = true;
            tracing::debug!(target: targets::DRAG, source = ?self.id, "drag started");
            if self.config.ghost {
                self.create_ghost(page, ctx);
            } else if self.config.ghost_offset_x.is_some() || self.config.ghost_offset_y.is_some() {
                let shift = Point::new(
                    self.config
                        .ghost_offset_x
                        .map_or(0.0, |x| x - self.default_offset.x),
                    self.config
                        .ghost_offset_y
                        .map_or(0.0, |y| y - self.default_offset.y),
                );
                let current = translation(&*ctx.viewport, self.element);
                set_translation(&mut *ctx.viewport, self.element, current + shift);
            }
        }

        let mut args = DragMoveEventArgs {
            original_event: input.clone(),
            owner: self.id,
            start: self.start,
            page: self.last,
            next: page,
            cancel: false,
        };
        emit_with(ctx.dispatcher, &self.signals.drag_move, &mut args);
        let next = args.next;

        if !args.cancel {
            self.update_auto_scroll(ctx);

            let axis = self.config.axis;
            if self.config.ghost {
                if let Some(ghost) = self.ghost {
                    let total = on_axis(next - self.start, axis);
                    ghost.set_page_position(&mut *ctx.viewport, self.ghost_start + total);
                }
            } else {
                let delta = on_axis(next - self.last, axis);
                let current = translation(&*ctx.viewport, self.element);
                set_translation(&mut *ctx.viewport, self.element, current + delta);
            }

            self.dispatch_drag_events(page, input, ctx);
        }

        self.last = next;
    }

    pub(crate) fn pointer_up(&mut self, input: &mut PointerInput, ctx: &mut DragContext<'_>) {
        if !self.pressed {
            return;
        }
        let page = input.page;
        if input.is_touch() {
            input.prevent_default();
        }

        let mut args = self.base_args(Some(input.clone()), page);
        self.pointer_id = None;
        self.pressed = false;

        if std::mem::take(&mut self.aborted) {
            tracing::trace!(target: targets::DRAG, source = ?self.id, "released after vetoed start");
        } else if self.drag_started {
            if let Some(drop) = self.last_drop.take()
                && drop != self.element
            {
                let owner = self.owner();
                let details = DragDetails {
                    original_event: input.clone(),
                    start: self.start,
                    page,
                };
                tracing::debug!(target: targets::DRAG, source = ?self.id, ?drop, "dropping");
                ctx.publish(SyntheticEvent::Drop, drop, &owner, &details);
                ctx.publish(SyntheticEvent::Leave, drop, &owner, &details);
            }

            emit_with(ctx.dispatcher, &self.signals.drag_end, &mut args);
            self.run_commands(ctx);
            if !self.anim_in_progress {
                self.transition_end(ctx);
            }
        } else {
            tracing::trace!(target: targets::DRAG, source = ?self.id, "released below tolerance");
            emit_with(ctx.dispatcher, &self.signals.drag_click, &mut args);
        }

        self.stop_auto_scroll(ctx.timers);
    }

    pub(crate) fn pointer_lost(&mut self, input: &PointerInput, ctx: &mut DragContext<'_>) {
        if !self.pressed {
            return;
        }

        let mut args = self.base_args(Some(input.clone()), input.page);
        self.pointer_id = None;
        self.pressed = false;
        self.aborted = false;

        if self.drag_started {
            if let Some(previous) = self.last_drop.take() {
                let details = DragDetails {
                    original_event: input.clone(),
                    start: self.start,
                    page: input.page,
                };
                ctx.publish(SyntheticEvent::Leave, previous, &self.owner(), &details);
            }

            emit_with(ctx.dispatcher, &self.signals.drag_end, &mut args);
            self.run_commands(ctx);
            if !self.anim_in_progress {
                self.transition_end(ctx);
            }
        }

        self.stop_auto_scroll(ctx.timers);
        tracing::debug!(target: targets::DRAG, source = ?self.id, "pointer capture lost");
    }

    /// Finish a drag or a programmatic transition.
    ///
    /// Hosts call this (through the manager) when a CSS transition on the
    /// element or the ghost ends; it also runs directly when a drag ends with
    /// nothing animating.
    pub(crate) fn transition_end(&mut self, ctx: &mut DragContext<'_>) {
        if (!self.drag_started && !self.anim_in_progress) || self.pressed {
            return;
        }

        if self.config.ghost {
            if let Some(ghost) = self.ghost {
                self.ghost_start = page_position(&*ctx.viewport, self.element);

                let mut args = GhostEventArgs {
                    owner: self.id,
                    ghost: ghost.element(),
                    cancel: false,
                };
                emit_with(ctx.dispatcher, &self.signals.ghost_destroy, &mut args);
                if args.cancel {
                    tracing::debug!(target: targets::GHOST, source = ?self.id, "ghost teardown vetoed");
                    self.anim_in_progress = false;
                    self.drag_started = false;
                    return;
                }
                self.ghost = None;
                ghost.release(&mut *ctx.viewport);
            }
        } else {
            disarm_transition(&mut *ctx.viewport, self.element);
        }

        self.anim_in_progress = false;
        self.drag_started = false;

        let mut args = self.base_args(None, self.start);
        emit_with(ctx.dispatcher, &self.signals.transitioned, &mut args);
    }

    // =========================================================================
    // Ghost, hit-testing and auto-scroll
    // =========================================================================

    /// Create the ghost for a drag currently at `page`. Returns whether a
    /// ghost exists afterwards.
    fn create_ghost(&mut self, page: Point, ctx: &mut DragContext<'_>) -> bool {
        if !self.config.ghost {
            return false;
        }
        if let Some(ghost) = self.ghost {
            if let Some(pointer_id) = self.pointer_id {
                ctx.viewport.set_pointer_capture(ghost.element(), pointer_id);
            }
            return true;
        }

        let request = GhostRequest {
            source: self.element,
            template: self.ghost_template,
            class: self.config.ghost_class.as_deref(),
            host: self.ghost_host,
        };
        let owner = self.id;
        let signal = &self.signals.ghost_create;
        let dispatcher = ctx.dispatcher;
        let anchor = self.ghost_start + (page - self.start);

        let created = Ghost::create(&mut *ctx.viewport, request, anchor, |element| {
            let mut args = GhostEventArgs {
                owner,
                ghost: element,
                cancel: false,
            };
            emit_with(dispatcher, signal, &mut args);
            !args.cancel
        });
        let Some(ghost) = created else {
            return false;
        };

        if let Some(pointer_id) = self.pointer_id {
            ctx.viewport.set_pointer_capture(ghost.element(), pointer_id);
        }
        self.ghost = Some(ghost);
        true
    }

    fn dispatch_drag_events(&mut self, page: Point, input: &PointerInput, ctx: &mut DragContext<'_>) {
        let _span = PerfSpan::new(span_names::HIT_TEST);

        let stack = elements_at_point(&*ctx.viewport, page);
        let top = find_drop_target(&*ctx.viewport, &stack, self.element, self.ghost_element());
        let owner = self.owner();
        let details = DragDetails {
            original_event: input.clone(),
            start: self.start,
            page,
        };

        match (top, self.last_drop) {
            (Some(top), last) if last != Some(top) => {
                if let Some(previous) = last {
                    ctx.publish(SyntheticEvent::Leave, previous, &owner, &details);
                }
                self.last_drop = Some(top);
                ctx.publish(SyntheticEvent::Enter, top, &owner, &details);
                ctx.publish(SyntheticEvent::Over, top, &owner, &details);
            }
            (Some(top), _) => ctx.publish(SyntheticEvent::Over, top, &owner, &details),
            (None, Some(previous)) => {
                ctx.publish(SyntheticEvent::Leave, previous, &owner, &details);
                self.last_drop = None;
            }
            (None, None) => {}
        }
    }

    fn update_auto_scroll(&mut self, ctx: &mut DragContext<'_>) {
        let viewport = &*ctx.viewport;
        let location = self.current_location(viewport);
        let size = match self.ghost {
            Some(ghost) if self.config.ghost => viewport.offset_size(ghost.element()),
            _ => viewport.offset_size(self.element),
        };
        let direction = detect_direction(
            viewport,
            location,
            size,
            self.scroll_container,
            self.config.auto_scroll.threshold,
        );

        match (direction, self.scroll) {
            (Some(direction), None) => {
                let timer = ctx.timers.start_repeating(self.config.auto_scroll.interval());
                self.scroll = Some(ScrollLoop::start(
                    &*ctx.viewport,
                    timer,
                    direction,
                    self.scroll_container,
                ));
            }
            (None, Some(_)) => self.stop_auto_scroll(ctx.timers),
            _ => {}
        }
    }

    fn scroll_tick(&mut self, ctx: &mut DragContext<'_>) {
        let Some(scroll) = self.scroll else {
            return;
        };
        let delta = scroll.step_delta(&*ctx.viewport, self.scroll_container, self.config.auto_scroll.step);
        let moved = ScrollLoop::apply(&mut *ctx.viewport, self.scroll_container, delta);
        tracing::trace!(target: targets::AUTOSCROLL, source = ?self.id, dx = moved.x, dy = moved.y, "scroll tick");
        if moved == Point::ZERO {
            return;
        }

        if self.config.ghost {
            if self.scroll_container.is_none()
                && let Some(ghost) = self.ghost
            {
                let position = ghost.page_position(&*ctx.viewport);
                ghost.set_page_position(&mut *ctx.viewport, position + moved);
            }
        } else {
            let current = translation(&*ctx.viewport, self.element);
            set_translation(&mut *ctx.viewport, self.element, current + moved);
            if self.scroll_container.is_none() {
                self.last += moved;
            }
        }
    }

    fn stop_auto_scroll(&mut self, timers: &mut TimerManager) {
        if let Some(scroll) = self.scroll.take() {
            if let Err(err) = timers.stop(scroll.timer) {
                tracing::trace!(target: targets::AUTOSCROLL, %err, "scroll timer already gone");
            }
            tracing::debug!(target: targets::AUTOSCROLL, source = ?self.id, "scroll loop stopped");
        }
    }

    pub(crate) fn on_timer(&mut self, timer: TimerId, ctx: &mut DragContext<'_>) {
        if self.scroll.is_some_and(|scroll| scroll.timer == timer) {
            self.scroll_tick(ctx);
        } else if let Some((pending, deferred)) = self.deferred
            && pending == timer
        {
            self.deferred = None;
            self.run_deferred(deferred, ctx);
        }
    }

    // =========================================================================
    // Programmatic repositioning
    // =========================================================================

    /// Move the ghost (or, without ghosting, the element) so its top-left is
    /// at `location` in page space.
    pub(crate) fn set_location(&mut self, location: DragLocation, ctx: &mut DragContext<'_>) {
        let target = location.to_point();
        if self.config.ghost {
            if let Some(ghost) = self.ghost {
                ghost.set_page_position(&mut *ctx.viewport, target);
            }
        } else {
            let delta = target - page_position(&*ctx.viewport, self.element);
            let current = translation(&*ctx.viewport, self.element);
            set_translation(&mut *ctx.viewport, self.element, current + delta);
        }
        self.start = page_position(&*ctx.viewport, self.element);
    }

    pub(crate) fn transition_to_origin(
        &mut self,
        args: TransitionArgs,
        start: Option<DragLocation>,
        ctx: &mut DragContext<'_>,
    ) {
        if self.detached {
            return;
        }
        let origin = origin_position(&*ctx.viewport, self.element);
        match start {
            Some(start) if start.to_point() == origin => return,
            None if self.config.ghost && self.ghost.is_none() => return,
            _ => {}
        }

        if let Some(start) = start
            && start.to_point() != self.current_location(&*ctx.viewport)
        {
            if self.config.ghost && self.ghost.is_none() {
                self.start = start.to_point();
                self.ghost_start = self.start;
                if !self.create_ghost(self.start, ctx) {
                    tracing::debug!(target: targets::DRAG, source = ?self.id, "transition aborted, no ghost");
                    return;
                }
            }
            self.set_location(start, ctx);
        }

        self.anim_in_progress = true;
        self.schedule(Deferred::ToOrigin(args), ctx.timers);
    }

    pub(crate) fn transition_to(
        &mut self,
        target: TransitionTarget,
        args: TransitionArgs,
        start: Option<DragLocation>,
        ctx: &mut DragContext<'_>,
    ) {
        if self.detached {
            return;
        }
        let ghost_missing = self.config.ghost && self.ghost.is_none();
        match start {
            Some(start) if ghost_missing => {
                self.start = start.to_point();
                self.ghost_start = self.start;
            }
            Some(start) => self.set_location(start, ctx),
            None if ghost_missing => {
                self.start = page_position(&*ctx.viewport, self.element);
                self.ghost_start = self.start;
            }
            None => {}
        }

        if ghost_missing && !self.create_ghost(self.start, ctx) {
            tracing::debug!(target: targets::DRAG, source = ?self.id, "transition aborted, no ghost");
            return;
        }

        self.anim_in_progress = true;
        self.schedule(Deferred::To(target, args), ctx.timers);
    }

    fn schedule(&mut self, deferred: Deferred, timers: &mut TimerManager) {
        if let Some((pending, _)) = self.deferred.take()
            && timers.stop(pending).is_ok()
        {
            tracing::trace!(target: targets::DRAG, source = ?self.id, "replaced pending transition");
        }
        let timer = timers.start_one_shot(Duration::ZERO);
        self.deferred = Some((timer, deferred));
    }

    fn run_deferred(&mut self, deferred: Deferred, ctx: &mut DragContext<'_>) {
        if self.config.ghost && self.ghost.is_none() {
            self.transition_end(ctx);
            return;
        }

        let default_duration = self.config.return_duration();
        let moved = match self.ghost {
            Some(ghost) if self.config.ghost => ghost.element(),
            _ => self.element,
        };
        let ghosted = moved != self.element;

        match deferred {
            Deferred::ToOrigin(args) => {
                let properties = if ghosted { "top, left" } else { "transform" };
                arm_transition(&mut *ctx.viewport, moved, properties, &args, default_duration);
                if ghosted {
                    let home = page_position(&*ctx.viewport, self.element);
                    self.set_location(home.into(), ctx);
                } else {
                    self.start = page_position(&*ctx.viewport, self.element);
                    set_translation(&mut *ctx.viewport, self.element, Point::ZERO);
                }
            }
            Deferred::To(target, args) => {
                let properties = if ghosted { "left, top" } else { "transform" };
                arm_transition(&mut *ctx.viewport, moved, properties, &args, default_duration);
                let location = match target {
                    TransitionTarget::Location(location) => location,
                    TransitionTarget::Element(element) => page_position(&*ctx.viewport, element).into(),
                };
                self.set_location(location, ctx);
            }
        }
        tracing::debug!(target: targets::DRAG, source = ?self.id, ?deferred, "transition armed");
    }

    /// Run the requests slots queued through [`DragCommands`].
    pub(crate) fn run_commands(&mut self, ctx: &mut DragContext<'_>) {
        for command in self.commands.take() {
            match command {
                DragCommand::SetLocation(location) => self.set_location(location, ctx),
                DragCommand::TransitionTo {
                    target,
                    args,
                    start,
                } => self.transition_to(target, args, start, ctx),
                DragCommand::TransitionToOrigin { args, start } => {
                    self.transition_to_origin(args, start, ctx)
                }
            }
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Tear the source down. Safe to call more than once.
    pub(crate) fn detach(&mut self, ctx: &mut DragContext<'_>) {
        if self.detached {
            return;
        }
        self.detached = true;
        self.signals.disconnect_all();

        if let Some(ghost) = self.ghost.take() {
            ghost.release(&mut *ctx.viewport);
        }
        self.stop_auto_scroll(ctx.timers);
        if let Some((pending, _)) = self.deferred.take()
            && ctx.timers.stop(pending).is_err()
        {
            tracing::trace!(target: targets::DRAG, source = ?self.id, "deferred transition already fired");
        }
        self.commands.take();

        self.pointer_id = None;
        self.pressed = false;
        self.aborted = false;
        self.drag_started = false;
        self.anim_in_progress = false;
        self.last_drop = None;

        ctx.viewport.remove_class(self.element, DRAG_CLASS);
        ctx.viewport.remove_class(self.element, SELECT_DISABLED_CLASS);
        tracing::debug!(target: targets::DRAG, source = ?self.id, "drag source detached");
    }
}

fn on_axis(delta: Point, axis: DragAxis) -> Point {
    Point::new(
        if axis.allows_x() { delta.x } else { 0.0 },
        if axis.allows_y() { delta.y } else { 0.0 },
    )
}
