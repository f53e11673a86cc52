use serde::Serialize;

use crate::checks::TnBreakdown;
use crate::expr::RollResult;
use crate::hob::EventPool;

/// How the defender's soak was put together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SoakBreakdown {
    pub base_defense: i32,
    pub defense_effect: f64,
    pub defense_penalty: f64,
    pub polearm: i32,
    /// Defense removed because bows and crossbows halve it.
    pub bow_reduction: i32,
    /// Defense ignored outright by firearms and artillery.
    pub firearm_ignored: f64,
    pub armor_rolled: i32,
    pub armor_cut: i32,
    pub armor_pierced: bool,
    pub ranged_resist: f64,
    /// Damage the attacker took from charging a braced polearm line.
    pub counter_charge: i32,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventReport {
    pub pool: EventPool,
    pub key: String,
    pub title: String,
    pub text: String,
    pub summary: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediate_tn: Option<RollResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediate_damage: Option<RollResult>,
}

/// Structured outcome of one resolution, handed to a [`Renderer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub actor: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub tn: i32,
    pub tn_breakdown: TnBreakdown,
    pub roll: i32,
    pub success: bool,
    pub margin: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    /// Number of times damage landed on the target.
    pub hits: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morale_loss: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soak: Option<SoakBreakdown>,
    pub events: Vec<EventReport>,
    /// Summaries of what a maneuver or command changed.
    pub applied: Vec<String>,
    pub log: Vec<String>,
}

pub trait Renderer {
    fn render(&mut self, report: &ActionReport);
}

/// Emits every report as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn render(&mut self, report: &ActionReport) {
        tracing::info!(
            actor = %report.actor,
            action = %report.label,
            tn = report.tn,
            roll = report.roll,
            success = report.success,
            damage = ?report.damage,
            "resolved"
        );
    }
}

/// Keeps every report it is handed.
#[derive(Debug, Default, Clone)]
pub struct CollectingRenderer {
    pub reports: Vec<ActionReport>,
}

impl Renderer for CollectingRenderer {
    fn render(&mut self, report: &ActionReport) {
        self.reports.push(report.clone());
    }
}
