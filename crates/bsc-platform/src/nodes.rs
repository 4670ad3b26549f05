use fxhash::FxHashSet;
use lazy_static::lazy_static;

/// Built-in scenegraph node types accepted by `CreateObject("roSGNode", name)`.
pub const SCENEGRAPH_NODES: &[&str] = &[
    "Animation",
    "ArrayGrid",
    "Audio",
    "BusySpinner",
    "Button",
    "ButtonGroup",
    "ChannelStore",
    "CheckList",
    "ColorFieldInterpolator",
    "ComponentLibrary",
    "ContentNode",
    "Dialog",
    "DynamicCustomKeyboard",
    "DynamicKeyboard",
    "DynamicMiniKeyboard",
    "DynamicPinPad",
    "FloatFieldInterpolator",
    "Font",
    "GridPanel",
    "Group",
    "InfoPane",
    "Keyboard",
    "KeyboardDialog",
    "Label",
    "LabelList",
    "LayoutGroup",
    "ListPanel",
    "MarkupGrid",
    "MarkupList",
    "MaskGroup",
    "MiniKeyboard",
    "MultiStyleLabel",
    "Node",
    "Overhang",
    "OverhangPanelSetScene",
    "Panel",
    "PanelSet",
    "ParallelAnimation",
    "PinDialog",
    "PinPad",
    "Poster",
    "PosterGrid",
    "ProgressDialog",
    "RadioButtonList",
    "Rectangle",
    "RowList",
    "Scene",
    "ScrollableText",
    "ScrollingLabel",
    "SequentialAnimation",
    "SimpleLabel",
    "SoundEffect",
    "StandardDialog",
    "StandardKeyboardDialog",
    "StandardMessageDialog",
    "StandardPinPadDialog",
    "StandardProgressDialog",
    "StdDlgActionCardItem",
    "StdDlgBulletTextItem",
    "StdDlgButton",
    "StdDlgButtonArea",
    "StdDlgContentArea",
    "StdDlgDeterminateProgressItem",
    "StdDlgGraphicItem",
    "StdDlgKeyboardItem",
    "StdDlgMultiStyleTextItem",
    "StdDlgProgressItem",
    "StdDlgSideCardArea",
    "StdDlgTextItem",
    "StdDlgTitleArea",
    "TargetGroup",
    "TargetList",
    "TargetSet",
    "Task",
    "TextEditBox",
    "Timer",
    "TrickPlayBar",
    "Vector2DFieldInterpolator",
    "Video",
    "VoiceTextEditBox",
    "ZoomRowList",
];

lazy_static! {
    static ref NODE_KEYS: FxHashSet<String> = SCENEGRAPH_NODES.iter().map(|name| name.to_lowercase()).collect();
}

pub fn is_builtin_node(name: &str) -> bool {
    NODE_KEYS.contains(&name.to_lowercase())
}
