//! The bytecode instruction catalog.
//!
//! The numbering here is a contract with the interpreter that executes the
//! emitted programs; discriminants are stable and must never be reused. An
//! instruction is one opcode byte optionally followed by a 2-byte big-endian
//! operand, so the widest instruction is [`MAX_INSTR_LEN`] bytes.

/// Maximum encoded width of one instruction in bytes.
pub const MAX_INSTR_LEN: usize = 3;

/// Attribute names that are bookkeeping locals rather than user attributes.
///
/// References to these compile to `load_local` instead of `load_attr`.
pub const PREDEFINED_ATTRS: &[&str] = &["i", "i0"];

/// A bytecode operation.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Push a string constant by table index.
    LoadStr = 1,
    /// Push the value of a runtime attribute by name.
    LoadAttr = 2,
    /// Push the value of a predefined bookkeeping local by name.
    LoadLocal = 3,
    /// Pop an object, push its named property.
    LoadProp = 4,
    /// Pop a property name and an object, push the property value.
    LoadPropInd = 5,
    /// Pop a value, store it into the template under a name.
    StoreAttr = 6,
    /// Pop a value, store it as the template's sole formal argument.
    StoreSoleArg = 7,
    /// Forward the enclosing template's remaining attributes.
    SetPassThru = 8,
    /// Pop a value, store it as the rendering option for the operand code.
    StoreOption = 9,
    /// Create an instance of the named template.
    New = 10,
    /// Pop a template name, create an instance of it.
    NewInd = 11,
    /// Pop a template and a value, apply the template across the value.
    Map = 12,
    /// Pop N templates and a value, apply them in rotation across the value.
    RotMap = 13,
    /// Unconditional jump to the operand address.
    Br = 14,
    /// Pop a value, jump to the operand address if it tests false.
    Brf = 15,
    /// Pop a value, jump to the operand address if it tests true.
    Brt = 16,
    /// Begin a rendering-options block.
    Options = 17,
    /// Push a new empty list.
    List = 18,
    /// Pop a value and a list, append the value to the list.
    Add = 19,
    /// Pop a value, push its text rendering.
    ToStr = 20,
    First = 21,
    Last = 22,
    Rest = 23,
    Trunc = 24,
    Strip = 25,
    Trim = 26,
    Length = 27,
    Strlen = 28,
    Reverse = 29,
    /// Pop a value and write it to the output.
    Write = 30,
    /// Pop a value and write it honoring the current options block.
    WriteOpt = 31,
    /// Do nothing.
    Noop = 32,
}

/// How an instruction's operand is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Opcode only, no operand bytes.
    None,
    /// Index into the string constant table.
    Str,
    /// Plain integer.
    Int,
    /// Address within the code.
    Addr,
}

impl Op {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::LoadStr => "load_str",
            Op::LoadAttr => "load_attr",
            Op::LoadLocal => "load_local",
            Op::LoadProp => "load_prop",
            Op::LoadPropInd => "load_prop_ind",
            Op::StoreAttr => "store_attr",
            Op::StoreSoleArg => "store_sole_arg",
            Op::SetPassThru => "set_pass_thru",
            Op::StoreOption => "store_option",
            Op::New => "new",
            Op::NewInd => "new_ind",
            Op::Map => "map",
            Op::RotMap => "rot_map",
            Op::Br => "br",
            Op::Brf => "brf",
            Op::Brt => "brt",
            Op::Options => "options",
            Op::List => "list",
            Op::Add => "add",
            Op::ToStr => "tostr",
            Op::First => "first",
            Op::Last => "last",
            Op::Rest => "rest",
            Op::Trunc => "trunc",
            Op::Strip => "strip",
            Op::Trim => "trim",
            Op::Length => "length",
            Op::Strlen => "strlen",
            Op::Reverse => "reverse",
            Op::Write => "write",
            Op::WriteOpt => "write_opt",
            Op::Noop => "noop",
        }
    }

    pub fn operand(self) -> Operand {
        match self {
            Op::LoadStr
            | Op::LoadAttr
            | Op::LoadLocal
            | Op::LoadProp
            | Op::StoreAttr
            | Op::New => Operand::Str,
            Op::StoreOption | Op::RotMap => Operand::Int,
            Op::Br | Op::Brf | Op::Brt => Operand::Addr,
            _ => Operand::None,
        }
    }

    /// Encoded width of an instruction with this opcode.
    pub fn width(self) -> usize {
        match self.operand() {
            Operand::None => 1,
            _ => MAX_INSTR_LEN,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        let op = match b {
            1 => Op::LoadStr,
            2 => Op::LoadAttr,
            3 => Op::LoadLocal,
            4 => Op::LoadProp,
            5 => Op::LoadPropInd,
            6 => Op::StoreAttr,
            7 => Op::StoreSoleArg,
            8 => Op::SetPassThru,
            9 => Op::StoreOption,
            10 => Op::New,
            11 => Op::NewInd,
            12 => Op::Map,
            13 => Op::RotMap,
            14 => Op::Br,
            15 => Op::Brf,
            16 => Op::Brt,
            17 => Op::Options,
            18 => Op::List,
            19 => Op::Add,
            20 => Op::ToStr,
            21 => Op::First,
            22 => Op::Last,
            23 => Op::Rest,
            24 => Op::Trunc,
            25 => Op::Strip,
            26 => Op::Trim,
            27 => Op::Length,
            28 => Op::Strlen,
            29 => Op::Reverse,
            30 => Op::Write,
            31 => Op::WriteOpt,
            32 => Op::Noop,
            _ => return None,
        };
        Some(op)
    }

    /// The dedicated opcode for a built-in function name, if there is one.
    pub fn for_function(name: &str) -> Option<Self> {
        let op = match name {
            "first" => Op::First,
            "last" => Op::Last,
            "rest" => Op::Rest,
            "trunc" => Op::Trunc,
            "strip" => Op::Strip,
            "trim" => Op::Trim,
            "length" => Op::Length,
            "strlen" => Op::Strlen,
            "reverse" => Op::Reverse,
            _ => return None,
        };
        Some(op)
    }
}

/// A recognized rendering option, encoded as the `store_option` operand.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOption {
    Anchor = 0,
    Format = 1,
    Null = 2,
    Separator = 3,
    Wrap = 4,
}

impl RenderOption {
    pub fn from_name(name: &str) -> Option<Self> {
        let opt = match name {
            "anchor" => RenderOption::Anchor,
            "format" => RenderOption::Format,
            "null" => RenderOption::Null,
            "separator" => RenderOption::Separator,
            "wrap" => RenderOption::Wrap,
            _ => return None,
        };
        Some(opt)
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderOption::Anchor => "anchor",
            RenderOption::Format => "format",
            RenderOption::Null => "null",
            RenderOption::Separator => "separator",
            RenderOption::Wrap => "wrap",
        }
    }

    /// The value stored when the option is given without one.
    pub fn default_value(self) -> Option<&'static str> {
        match self {
            RenderOption::Anchor => Some("true"),
            RenderOption::Wrap => Some("\n"),
            _ => None,
        }
    }
}
