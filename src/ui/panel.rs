// src/ui/panel.rs
//! Debug control panel for the scene transform
//!
//! The panel keeps a copy of the [`TransformState`] it was given and never writes
//! to application state itself: every edit is snapped to the field's step,
//! clamped to its range and handed back whole through the `on_update` callback.

use log::debug;

use crate::gfx::scene::TransformState;

/// One numeric slider bound to a field of [`TransformState`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberField {
    /// Field path understood by [`TransformState::with_field`]
    pub path: &'static str,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl NumberField {
    /// Decimal places implied by the step
    pub fn decimals(&self) -> i32 {
        if self.step <= 0.0 || self.step >= 1.0 {
            return 0;
        }
        (-self.step.log10()).ceil() as i32
    }

    /// Rounds `value` to the step precision and clamps it into range
    ///
    /// Returns `None` for NaN.
    pub fn snap(&self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        let factor = 10f32.powi(self.decimals());
        let rounded = if value.is_finite() {
            (value * factor).round() / factor
        } else {
            value
        };
        Some(rounded.clamp(self.min, self.max))
    }

    fn display_format(&self) -> String {
        format!("%.{}f", self.decimals())
    }
}

/// Sliders shown by [`TransformPanel`], in display order
pub const TRANSFORM_FIELDS: [NumberField; 4] = [
    NumberField {
        path: "x",
        label: "x",
        min: -20.0,
        max: 20.0,
        step: 0.01,
    },
    NumberField {
        path: "y",
        label: "y",
        min: -20.0,
        max: 20.0,
        step: 0.01,
    },
    NumberField {
        path: "z",
        label: "z",
        min: -20.0,
        max: 20.0,
        step: 0.01,
    },
    NumberField {
        path: "masterScale",
        label: "Master Scale",
        min: 0.5,
        max: 3.0,
        step: 0.01,
    },
];

pub fn transform_field(path: &str) -> Option<&'static NumberField> {
    TRANSFORM_FIELDS.iter().find(|field| field.path == path)
}

/// Panel editing the scene transform
pub struct TransformPanel {
    title: String,
    data: TransformState,
    on_update: Box<dyn FnMut(TransformState)>,
}

impl TransformPanel {
    pub fn new<F>(data: TransformState, on_update: F) -> Self
    where
        F: FnMut(TransformState) + 'static,
    {
        Self {
            title: "Debug".to_string(),
            data,
            on_update: Box::new(on_update),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// State the panel currently displays
    pub fn data(&self) -> TransformState {
        self.data
    }

    /// Replaces the displayed state without calling `on_update`
    pub fn sync(&mut self, data: TransformState) {
        self.data = data;
    }

    /// Applies an edit of one field and commits the resulting state
    ///
    /// Returns the committed state, or `None` when the path is unknown, the value
    /// is NaN, or the snapped value leaves the state unchanged.
    pub fn edit(&mut self, path: &str, value: f32) -> Option<TransformState> {
        let field = transform_field(path)?;
        let value = field.snap(value)?;
        let next = self.data.with_field(path, value)?;
        if next == self.data {
            return None;
        }
        self.commit(next);
        Some(next)
    }

    /// Restores the default transform
    pub fn reset(&mut self) {
        self.commit(TransformState::default());
    }

    fn commit(&mut self, next: TransformState) {
        debug!("Transform update {:?}", next);
        self.data = next;
        (self.on_update)(next);
    }

    /// Draws the panel and commits whatever the user changed this frame
    pub fn draw(&mut self, ui: &imgui::Ui) {
        let display_size = ui.io().display_size;
        // Guard against invalid display size
        if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
            return;
        }

        let data = self.data;
        let mut edits: Vec<(&'static str, f32)> = Vec::new();
        let mut reset = false;

        ui.window(&self.title)
            .size([360.0, 220.0], imgui::Condition::FirstUseEver)
            .position([20.0, 20.0], imgui::Condition::FirstUseEver)
            .resizable(true)
            .collapsible(true)
            .build(|| {
                for field in &TRANSFORM_FIELDS {
                    let Some(mut value) = data.field(field.path) else {
                        continue;
                    };
                    let _id = ui.push_id(field.path);
                    ui.set_next_item_width(-110.0);
                    if ui
                        .slider_config(field.label, field.min, field.max)
                        .display_format(field.display_format())
                        .build(&mut value)
                    {
                        edits.push((field.path, value));
                    }
                    ui.same_line();
                    ui.set_next_item_width(-1.0);
                    let mut text = format!("{:.*}", field.decimals() as usize, value);
                    if ui
                        .input_text("##value", &mut text)
                        .enter_returns_true(true)
                        .build()
                    {
                        if let Ok(typed) = text.trim().parse::<f32>() {
                            edits.push((field.path, typed));
                        }
                    }
                }

                ui.spacing();
                ui.separator();
                if ui.button("Reset") {
                    reset = true;
                }
            });

        if reset {
            self.reset();
        }
        for (path, value) in edits {
            self.edit(path, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_panel() -> (TransformPanel, Rc<RefCell<Vec<TransformState>>>) {
        let updates = Rc::new(RefCell::new(Vec::new()));
        let sink = updates.clone();
        let panel = TransformPanel::new(TransformState::default(), move |state| {
            sink.borrow_mut().push(state)
        });
        (panel, updates)
    }

    #[test]
    fn test_field_ranges() {
        let scale = transform_field("masterScale").unwrap();
        assert_eq!((scale.min, scale.max), (0.5, 3.0));
        assert_eq!(scale.label, "Master Scale");
        for path in ["x", "y", "z"] {
            let field = transform_field(path).unwrap();
            assert_eq!((field.min, field.max, field.step), (-20.0, 20.0, 0.01));
        }
        assert!(transform_field("w").is_none());
    }

    #[test]
    fn test_snap_rounds_and_clamps() {
        let scale = transform_field("masterScale").unwrap();
        assert_eq!(scale.decimals(), 2);
        assert_eq!(scale.snap(5.0), Some(3.0));
        assert_eq!(scale.snap(0.1), Some(0.5));
        assert_eq!(scale.snap(f32::INFINITY), Some(3.0));
        assert_eq!(scale.snap(f32::NAN), None);

        let x = transform_field("x").unwrap();
        assert_eq!(x.snap(-25.0), Some(-20.0));
        assert!((x.snap(1.234).unwrap() - 1.23).abs() < 1e-6);
    }

    #[test]
    fn test_edit_commits_whole_state() {
        let (mut panel, updates) = recording_panel();

        let committed = panel.edit("masterScale", 5.0).unwrap();
        assert_eq!(committed, TransformState::new(0.0, -10.0, 0.0, 3.0));
        assert_eq!(panel.data(), committed);

        panel.edit("x", 2.5);
        let updates = updates.borrow();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1], TransformState::new(2.5, -10.0, 0.0, 3.0));
    }

    #[test]
    fn test_ignored_edits() {
        let (mut panel, updates) = recording_panel();
        assert!(panel.edit("rotation", 1.0).is_none());
        assert!(panel.edit("y", f32::NAN).is_none());
        // Already the current value
        assert!(panel.edit("y", -10.0).is_none());
        assert!(updates.borrow().is_empty());
    }

    #[test]
    fn test_sync_and_reset() {
        let (mut panel, updates) = recording_panel();
        panel.sync(TransformState::new(1.0, 2.0, 3.0, 2.0));
        assert!(updates.borrow().is_empty());

        panel.reset();
        assert_eq!(panel.data(), TransformState::default());
        assert_eq!(updates.borrow().as_slice(), &[TransformState::default()]);
    }
}
