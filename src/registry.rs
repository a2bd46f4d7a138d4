// SPDX-License-Identifier: GPL-3.0-only

//! Width-specific keyboard variants built from shared templates.
//!
//! Each registered template gets one scaled variant per [`WidthClass`],
//! built eagerly at registration and rebuilt whenever the screen width
//! changes. Templates are held behind `Arc` and never mutated; every variant
//! owns its own copy of the geometry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::layout::Layout;
use crate::scaling::{ScaleError, ScaledLayout, Scaler};

/// Which presentation a variant is sized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidthClass {
    /// Full screen width
    Docked,
    /// A fraction of the screen width
    Floating,
}

/// Registry lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub layout_id: String,
    pub width_class: WidthClass,
}

impl VariantKey {
    pub fn new(layout_id: impl Into<String>, width_class: WidthClass) -> Self {
        Self {
            layout_id: layout_id.into(),
            width_class,
        }
    }
}

/// Holds templates and their scaled variants.
#[derive(Debug)]
pub struct VariantRegistry {
    scaler: Scaler,
    screen_width: i32,
    floating_width_ratio: f32,
    language_switch_visible: bool,
    templates: HashMap<String, Arc<Layout>>,
    variants: HashMap<VariantKey, ScaledLayout>,
}

impl VariantRegistry {
    pub fn new(scaler: Scaler, screen_width: i32, floating_width_ratio: f32) -> Self {
        Self {
            scaler,
            screen_width,
            floating_width_ratio,
            language_switch_visible: true,
            templates: HashMap::new(),
            variants: HashMap::new(),
        }
    }

    /// Target width for a width class at the current screen width.
    pub fn width_for(&self, class: WidthClass) -> i32 {
        match class {
            WidthClass::Docked => self.screen_width,
            WidthClass::Floating => (self.screen_width as f32 * self.floating_width_ratio) as i32,
        }
    }

    pub fn screen_width(&self) -> i32 {
        self.screen_width
    }

    pub fn language_switch_visible(&self) -> bool {
        self.language_switch_visible
    }

    /// Registers a template and builds its variants.
    ///
    /// Re-registering an id replaces the old template and variants.
    pub fn register(&mut self, template: Layout) -> Result<Arc<Layout>, ScaleError> {
        let template = Arc::new(template);
        self.register_shared(Arc::clone(&template))?;
        Ok(template)
    }

    /// Registers an already shared template.
    pub fn register_shared(&mut self, template: Arc<Layout>) -> Result<(), ScaleError> {
        let built = self.build_variants(&template)?;
        tracing::info!(layout = %template.id, "registered keyboard template");
        self.variants.extend(built);
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    fn build_variants(
        &self,
        template: &Layout,
    ) -> Result<Vec<(VariantKey, ScaledLayout)>, ScaleError> {
        [WidthClass::Docked, WidthClass::Floating]
            .into_iter()
            .map(|class| -> Result<(VariantKey, ScaledLayout), ScaleError> {
                let width = self.width_for(class);
                let mut scaled = self.scaler.scale(template, width)?;
                if !self.language_switch_visible {
                    scaled.set_language_switch_visibility(false);
                }
                tracing::debug!(layout = %template.id, ?class, width, "built keyboard variant");
                Ok((VariantKey::new(template.id.clone(), class), scaled))
            })
            .collect()
    }

    pub fn template(&self, layout_id: &str) -> Option<&Arc<Layout>> {
        self.templates.get(layout_id)
    }

    /// Registered template ids, sorted.
    pub fn layout_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn get(&self, key: &VariantKey) -> Option<&ScaledLayout> {
        self.variants.get(key)
    }

    pub fn get_mut(&mut self, key: &VariantKey) -> Option<&mut ScaledLayout> {
        self.variants.get_mut(key)
    }

    pub fn variant(&self, layout_id: &str, class: WidthClass) -> Option<&ScaledLayout> {
        self.get(&VariantKey::new(layout_id, class))
    }

    /// Rebuilds every variant for a new screen width.
    ///
    /// On error the registry keeps its previous width and variants.
    pub fn set_screen_width(&mut self, screen_width: i32) -> Result<(), ScaleError> {
        if screen_width == self.screen_width {
            return Ok(());
        }

        let previous = std::mem::replace(&mut self.screen_width, screen_width);
        let mut rebuilt = HashMap::with_capacity(self.variants.len());
        for template in self.templates.values() {
            match self.build_variants(template) {
                Ok(built) => rebuilt.extend(built),
                Err(err) => {
                    self.screen_width = previous;
                    return Err(err);
                }
            }
        }

        tracing::info!(from = previous, to = screen_width, "rebuilt keyboard variants");
        self.variants = rebuilt;
        Ok(())
    }

    /// Shows or hides the language-switch key on every variant, including
    /// ones built later.
    pub fn set_language_switch_visible(&mut self, visible: bool) {
        self.language_switch_visible = visible;
        for (key, scaled) in &mut self.variants {
            let outcome = scaled.set_language_switch_visibility(visible);
            tracing::debug!(layout = %key.layout_id, class = ?key.width_class, ?outcome, "applied language switch visibility");
        }
    }
}
