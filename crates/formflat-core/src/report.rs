//! Diagnostics for a flatten operation
//!
//! Per-widget and per-field outcomes are pushed to a [`FlattenObserver`].
//! [`FlattenReport`] is the collector returned by the flattener.

use crate::error::{FieldFailure, WidgetSkip};
use crate::flatten::FlattenedWidget;
use crate::fonts::FontChoice;

/// Receives flatten outcomes as they happen. All methods default to no-ops.
pub trait FlattenObserver: Send {
    fn font_selected(&mut self, _choice: FontChoice, _location: &str) {}

    fn appearance_regenerated(&mut self, _field: &str) {}

    fn widget_flattened(&mut self, _widget: &FlattenedWidget) {}

    fn widget_skipped(&mut self, _field: &str, _skip: &WidgetSkip) {}

    fn field_failed(&mut self, _failure: &FieldFailure) {}

    fn field_removed(&mut self, _field: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl FlattenObserver for NoopObserver {}

/// Summary of one flatten operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenReport {
    pub font: Option<FontChoice>,
    pub regenerated: Vec<String>,
    pub flattened: Vec<FlattenedWidget>,
    pub skipped: Vec<(String, WidgetSkip)>,
    pub failures: Vec<FieldFailure>,
    pub removed: Vec<String>,
}

impl FlattenReport {
    pub fn widgets_flattened(&self) -> usize {
        self.flattened.len()
    }

    pub fn widgets_skipped(&self) -> usize {
        self.skipped.len()
    }

    pub fn fields_removed(&self) -> usize {
        self.removed.len()
    }

    /// True when nothing was skipped and no field failed.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failures.is_empty()
    }
}

impl FlattenObserver for FlattenReport {
    fn font_selected(&mut self, choice: FontChoice, _location: &str) {
        self.font = Some(choice);
    }

    fn appearance_regenerated(&mut self, field: &str) {
        self.regenerated.push(field.to_string());
    }

    fn widget_flattened(&mut self, widget: &FlattenedWidget) {
        self.flattened.push(widget.clone());
    }

    fn widget_skipped(&mut self, field: &str, skip: &WidgetSkip) {
        self.skipped.push((field.to_string(), skip.clone()));
    }

    fn field_failed(&mut self, failure: &FieldFailure) {
        self.failures.push(failure.clone());
    }

    fn field_removed(&mut self, field: &str) {
        self.removed.push(field.to_string());
    }
}

/// Forwards every event to two observers.
pub(crate) struct Tee<'a> {
    pub first: &'a mut dyn FlattenObserver,
    pub second: &'a mut dyn FlattenObserver,
}

impl FlattenObserver for Tee<'_> {
    fn font_selected(&mut self, choice: FontChoice, location: &str) {
        self.first.font_selected(choice, location);
        self.second.font_selected(choice, location);
    }

    fn appearance_regenerated(&mut self, field: &str) {
        self.first.appearance_regenerated(field);
        self.second.appearance_regenerated(field);
    }

    fn widget_flattened(&mut self, widget: &FlattenedWidget) {
        self.first.widget_flattened(widget);
        self.second.widget_flattened(widget);
    }

    fn widget_skipped(&mut self, field: &str, skip: &WidgetSkip) {
        self.first.widget_skipped(field, skip);
        self.second.widget_skipped(field, skip);
    }

    fn field_failed(&mut self, failure: &FieldFailure) {
        self.first.field_failed(failure);
        self.second.field_failed(failure);
    }

    fn field_removed(&mut self, field: &str) {
        self.first.field_removed(field);
        self.second.field_removed(field);
    }
}
