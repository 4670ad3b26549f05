use fxhash::FxHashMap;
use lazy_static::lazy_static;

/// A function every BrightScript scope can call without declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalFunction {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
}

impl GlobalFunction {
    pub fn accepts(&self, arg_count: usize) -> bool {
        (self.min_args..=self.max_args).contains(&arg_count)
    }
}

macro_rules! global {
    ($name:literal, $min:literal) => {
        GlobalFunction { name: $name, min_args: $min, max_args: $min }
    };
    ($name:literal, $min:literal, $max:literal) => {
        GlobalFunction { name: $name, min_args: $min, max_args: $max }
    };
}

pub const GLOBAL_FUNCTIONS: &[GlobalFunction] = &[
    global!("Abs", 1),
    global!("Asc", 1),
    global!("Atn", 1),
    global!("Box", 1),
    global!("Cdbl", 1),
    global!("Chr", 1),
    global!("Cint", 1),
    global!("CopyFile", 2),
    global!("Cos", 1),
    global!("CreateDirectory", 1),
    global!("CreateObject", 1, 7),
    global!("Csng", 1),
    global!("DeleteDirectory", 1),
    global!("DeleteFile", 1),
    global!("Eval", 1),
    global!("Exp", 1),
    global!("FindMemberFunction", 2),
    global!("Fix", 1),
    global!("FormatDrive", 2),
    global!("FormatJson", 1, 2),
    global!("GetGlobalAA", 0),
    global!("GetInterface", 2),
    global!("GetLastRunCompileError", 0),
    global!("GetLastRunRuntimeError", 0),
    global!("Instr", 3),
    global!("Int", 1),
    global!("LCase", 1),
    global!("Left", 2),
    global!("Len", 1),
    global!("ListDir", 1),
    global!("Log", 1),
    global!("MatchFiles", 2),
    global!("Mid", 2, 3),
    global!("MoveFile", 2),
    global!("ObjFun", 2, 11),
    global!("ParseJson", 1, 2),
    global!("ReadAsciiFile", 1),
    global!("RebootSystem", 0),
    global!("Right", 2),
    global!("Rnd", 1),
    global!("Run", 1, 10),
    global!("Sgn", 1),
    global!("Sin", 1),
    global!("Sleep", 1),
    global!("Sqr", 1),
    global!("Str", 1),
    global!("StrI", 1, 2),
    global!("String", 2),
    global!("StringI", 2),
    global!("StrToI", 1),
    global!("Substitute", 2, 5),
    global!("Tan", 1),
    global!("Tr", 1),
    global!("Type", 1, 2),
    global!("UCase", 1),
    global!("UpTime", 1),
    global!("Val", 1, 2),
    global!("Wait", 2),
    global!("WriteAsciiFile", 2),
];

lazy_static! {
    static ref FUNCTION_INDEX: FxHashMap<String, &'static GlobalFunction> =
        GLOBAL_FUNCTIONS.iter().map(|function| (function.name.to_lowercase(), function)).collect();
}

pub fn lookup(name: &str) -> Option<&'static GlobalFunction> {
    FUNCTION_INDEX.get(&name.to_lowercase()).copied()
}
