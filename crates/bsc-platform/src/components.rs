use fxhash::FxHashMap;
use lazy_static::lazy_static;

/// A BrightScript component that `CreateObject` can construct.
///
/// `arities` lists the accepted constructor argument counts, not counting the
/// component name itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrightScriptComponent {
    pub name: &'static str,
    pub arities: &'static [usize],
    pub deprecation: Option<&'static str>,
}

impl BrightScriptComponent {
    pub fn accepts(&self, arg_count: usize) -> bool {
        self.arities.contains(&arg_count)
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation.is_some()
    }
}

const SDK1: Option<&str> = Some("SDK1 screens were removed from Roku OS; use SceneGraph components instead");

macro_rules! component {
    ($name:literal, [$($arity:literal),*]) => {
        BrightScriptComponent { name: $name, arities: &[$($arity),*], deprecation: None }
    };
    ($name:literal, [$($arity:literal),*], $note:expr) => {
        BrightScriptComponent { name: $name, arities: &[$($arity),*], deprecation: $note }
    };
}

pub const COMPONENTS: &[BrightScriptComponent] = &[
    component!("roAppInfo", [0]),
    component!("roAppManager", [0]),
    component!("roArray", [2]),
    component!("roAssociativeArray", [0]),
    component!("roAudioGuide", [0]),
    component!("roAudioMetadata", [0], Some("roAudioMetadata is deprecated; read tags on the server instead")),
    component!("roAudioPlayer", [0]),
    component!("roAudioResource", [1]),
    component!("roBitmap", [1]),
    component!("roBoolean", [0]),
    component!("roByteArray", [0]),
    component!("roCECStatus", [0]),
    component!("roChannelStore", [0]),
    component!("roCodeRegistrationScreen", [0], SDK1),
    component!("roCompositor", [0]),
    component!("roDateTime", [0]),
    component!("roDeviceCrypto", [0]),
    component!("roDeviceInfo", [0]),
    component!("roDouble", [0]),
    component!("roEVPCipher", [0]),
    component!("roEVPDigest", [0]),
    component!("roFileSystem", [0]),
    component!("roFloat", [0]),
    component!("roFontRegistry", [0]),
    component!("roFunction", [0]),
    component!("roGridScreen", [0], SDK1),
    component!("roHdmiStatus", [0]),
    component!("roHMAC", [0]),
    component!("roHttpAgent", [0]),
    component!("roImageCanvas", [0], SDK1),
    component!("roImageMetadata", [0]),
    component!("roInput", [0]),
    component!("roInt", [0]),
    component!("roInvalid", [0]),
    component!("roKeyboardScreen", [0], SDK1),
    component!("roList", [0]),
    component!("roListScreen", [0], SDK1),
    component!("roLocalization", [0]),
    component!("roLongInteger", [0]),
    component!("roMessageDialog", [0], SDK1),
    component!("roMessagePort", [0]),
    component!("roOneLineDialog", [0], SDK1),
    component!("roParagraphScreen", [0], SDK1),
    component!("roPath", [1]),
    component!("roPinEntryDialog", [0], SDK1),
    component!("roPosterScreen", [0], SDK1),
    component!("roRegex", [2]),
    component!("roRegion", [5]),
    component!("roRegistry", [0]),
    component!("roRegistrySection", [1]),
    component!("roRemoteInfo", [0]),
    component!("roScreen", [0, 1, 3]),
    component!("roSearchHistory", [0], SDK1),
    component!("roSearchScreen", [0], SDK1),
    component!("roSGNode", [1]),
    component!("roSGScreen", [0]),
    component!("roSlideShow", [0], SDK1),
    component!("roSocketAddress", [0]),
    component!("roSpringboardScreen", [0], SDK1),
    component!("roStreamSocket", [0]),
    component!("roString", [0]),
    component!("roSystemLog", [0]),
    component!("roTextScreen", [0], SDK1),
    component!("roTextToSpeech", [0]),
    component!("roTimespan", [0]),
    component!("roUrlTransfer", [0]),
    component!("roVideoPlayer", [0]),
    component!("roVideoScreen", [0], SDK1),
    component!("roXMLElement", [0]),
    component!("roXMLList", [0]),
];

lazy_static! {
    static ref COMPONENT_INDEX: FxHashMap<String, &'static BrightScriptComponent> =
        COMPONENTS.iter().map(|component| (component.name.to_lowercase(), component)).collect();
}

pub fn lookup(name: &str) -> Option<&'static BrightScriptComponent> {
    COMPONENT_INDEX.get(&name.to_lowercase()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arities_and_deprecation() {
        let regex = lookup("ROREGEX").unwrap();
        assert!(regex.accepts(2));
        assert!(!regex.accepts(1));
        assert!(lookup("roScreen").unwrap().accepts(3));
        assert!(lookup("roSearchScreen").unwrap().is_deprecated());
        assert!(lookup("roNotAThing").is_none());
    }

    #[test]
    fn names_are_unique() {
        assert_eq!(COMPONENT_INDEX.len(), COMPONENTS.len());
    }
}
