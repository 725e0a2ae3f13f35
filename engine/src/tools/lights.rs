//! Light Control Capabilities
//!
//! Simulated smart-home lighting. Nothing is switched for real: each call
//! returns the confirmation sentence the model relays to the user.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use sdk::capability::{Capability, CapabilityDescriptor, ParameterSpec};
use sdk::types::{ToolError, ToolInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LightAction {
    TurnOn,
    TurnOff,
    GetColors,
}

pub struct LightTool {
    action: LightAction,
    descriptor: CapabilityDescriptor,
}

impl LightTool {
    pub fn turn_on() -> Self {
        Self::new(
            LightAction::TurnOn,
            "TurnOnLight",
            "Turns on the light in a specific location",
            "The location of the light to turn on",
        )
    }

    pub fn turn_off() -> Self {
        Self::new(
            LightAction::TurnOff,
            "TurnOffLight",
            "Turns off the light in a specific location",
            "The location of the light to turn off",
        )
    }

    pub fn get_colors() -> Self {
        Self::new(
            LightAction::GetColors,
            "GetLightColors",
            "Gets the color of the light in a specific location",
            "The location of the light to get colors from",
        )
    }

    fn new(action: LightAction, name: &str, description: &str, location_help: &str) -> Self {
        Self {
            action,
            descriptor: CapabilityDescriptor::new(name, description)
                .with_parameter(ParameterSpec::required("location", location_help)),
        }
    }
}

#[async_trait]
impl Capability for LightTool {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, input: ToolInput) -> Result<String, ToolError> {
        let location = input.param_str("location")?;
        let location = location.trim();
        if location.is_empty() {
            return Err(ToolError::InvalidArgument(
                "location must not be empty".to_string(),
            ));
        }

        info!("{} in {}", self.descriptor.name, location);

        Ok(match self.action {
            LightAction::TurnOn => format!("The light in the {} has been turned ON.", location),
            LightAction::TurnOff => format!("The light in the {} has been turned OFF.", location),
            LightAction::GetColors => {
                format!("The light colors in the {} are Red, Green, Blue.", location)
            }
        })
    }
}

/// All light capabilities, ready to register.
pub fn light_capabilities() -> Vec<Arc<dyn Capability>> {
    vec![
        Arc::new(LightTool::turn_on()),
        Arc::new(LightTool::turn_off()),
        Arc::new(LightTool::get_colors()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(location: &str) -> ToolInput {
        ToolInput::new().with_param("location", json!(location))
    }

    #[tokio::test]
    async fn test_turn_on() {
        let out = LightTool::turn_on().invoke(at("kitchen")).await.unwrap();
        assert_eq!(out, "The light in the kitchen has been turned ON.");
    }

    #[tokio::test]
    async fn test_turn_off() {
        let out = LightTool::turn_off().invoke(at("bedroom")).await.unwrap();
        assert_eq!(out, "The light in the bedroom has been turned OFF.");
    }

    #[tokio::test]
    async fn test_get_colors() {
        let out = LightTool::get_colors()
            .invoke(at("living room"))
            .await
            .unwrap();
        assert_eq!(out, "The light colors in the living room are Red, Green, Blue.");
    }

    #[tokio::test]
    async fn test_blank_location_rejected() {
        let err = LightTool::turn_on().invoke(at("   ")).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[test]
    fn test_descriptors() {
        let names: Vec<String> = light_capabilities()
            .iter()
            .map(|c| c.descriptor().name.clone())
            .collect();
        assert_eq!(names, vec!["TurnOnLight", "TurnOffLight", "GetLightColors"]);

        let on = LightTool::turn_on();
        assert_eq!(on.descriptor().parameters.len(), 1);
        assert!(on.descriptor().parameters[0].required);
    }
}
