// Canvas styling for the diagram editor.
// The front end draws; this module only decides which colors it draws with.

use automa_model::{EdgeShape, Node, Transition};
use egui::Color32;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Every color the canvas uses, configurable from the editor config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub node_fill: Color32,
    pub node_stroke: Color32,
    pub node_accept_stroke: Color32,
    pub selected_node_stroke: Color32,
    pub node_label: Color32,

    pub transition_arrow: Color32,
    pub transition_selected_arrow: Color32,
    pub transition_label: Color32,
    pub tentative_transition_arrow: Color32,

    pub new_connection_glow: Color32,
    pub new_connection_shadow_opacity: f32,
    pub new_connection_shadow_blur: f32,

    pub node_drag_drop_shadow: Color32,
    pub node_drag_drop_shadow_opacity: f32,
    pub node_drag_drop_shadow_blur: f32,

    pub error_node_fill: Color32,
    pub error_node_stroke: Color32,
    pub error_icon_fill: Color32,
    pub error_icon_text: Color32,

    pub grid: Color32,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            node_fill: Color32::WHITE,
            node_stroke: Color32::BLACK,
            node_accept_stroke: Color32::from_rgb(0, 160, 0),
            selected_node_stroke: Color32::from_rgb(0, 90, 255),
            node_label: Color32::BLACK,

            transition_arrow: Color32::BLACK,
            transition_selected_arrow: Color32::from_rgb(220, 40, 40),
            transition_label: Color32::BLACK,
            tentative_transition_arrow: Color32::from_rgb(255, 0, 255),

            new_connection_glow: Color32::from_rgb(255, 230, 0),
            new_connection_shadow_opacity: 0.5,
            new_connection_shadow_blur: 10.0,

            node_drag_drop_shadow: Color32::BLACK,
            node_drag_drop_shadow_opacity: 0.5,
            node_drag_drop_shadow_blur: 10.0,

            error_node_fill: Color32::from_rgb(255, 204, 204),
            error_node_stroke: Color32::RED,
            error_icon_fill: Color32::RED,
            error_icon_text: Color32::WHITE,

            grid: Color32::from_rgb(204, 204, 204),
        }
    }
}

impl ColorScheme {
    /// Light-on-dark palette.
    pub fn dark() -> Self {
        Self {
            node_fill: Color32::from_rgb(40, 42, 48),
            node_stroke: Color32::from_rgb(200, 200, 200),
            node_accept_stroke: Color32::from_rgb(90, 220, 120),
            selected_node_stroke: Color32::from_rgb(90, 160, 255),
            node_label: Color32::WHITE,
            transition_arrow: Color32::from_rgb(200, 200, 200),
            transition_selected_arrow: Color32::from_rgb(255, 110, 110),
            transition_label: Color32::WHITE,
            grid: Color32::from_rgb(60, 60, 66),
            ..Self::default()
        }
    }

    pub fn node_appearance(&self, node: &Node, selected: bool) -> NodeAppearance {
        // Selection takes precedence over the accepting outline.
        let stroke = if selected {
            self.selected_node_stroke
        } else if node.accepting {
            self.node_accept_stroke
        } else {
            self.node_stroke
        };
        trace!("Node {} stroke {:?} (selected: {})", node.id, stroke, selected);
        NodeAppearance {
            fill: self.node_fill,
            stroke,
            label: self.node_label,
            double_ring: node.accepting,
        }
    }

    pub fn error_node_appearance(&self, node: &Node) -> NodeAppearance {
        NodeAppearance {
            fill: self.error_node_fill,
            stroke: self.error_node_stroke,
            label: self.node_label,
            double_ring: node.accepting,
        }
    }

    pub fn transition_appearance(
        &self,
        transition: &Transition,
        shape: EdgeShape,
        selected: bool,
    ) -> TransitionAppearance {
        let arrow = if selected {
            self.transition_selected_arrow
        } else {
            self.transition_arrow
        };
        TransitionAppearance {
            arrow,
            label_color: self.transition_label,
            label: transition.label(),
            shape,
        }
    }
}

/// How the canvas should paint one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeAppearance {
    pub fill: Color32,
    pub stroke: Color32,
    pub label: Color32,
    /// Accepting states are drawn with a second ring.
    pub double_ring: bool,
}

/// How the canvas should paint one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionAppearance {
    pub arrow: Color32,
    pub label_color: Color32,
    pub label: String,
    pub shape: EdgeShape,
}
