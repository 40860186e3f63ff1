//! Runtime support features ("lualib").
//!
//! Transformation records which helper functions the printed output depends
//! on; the printer materializes them according to `luaLibImport`. Feature
//! names are stable and double as the exported names in the bundled runtime.

use tslua_common::options::LuaTarget;

pub const LUALIB_BUNDLE_MODULE: &str = "lualib_bundle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LuaLibFeature {
    Unpack,
    ArrayConcat,
    Class,
}

impl LuaLibFeature {
    pub fn name(self) -> &'static str {
        match self {
            LuaLibFeature::Unpack => "__TS__Unpack",
            LuaLibFeature::ArrayConcat => "__TS__ArrayConcat",
            LuaLibFeature::Class => "__TS__Class",
        }
    }

    /// The feature's standalone Lua source, for `luaLibImport = "inline"`.
    pub fn inline_source(self, target: LuaTarget) -> String {
        match self {
            LuaLibFeature::Unpack => format!(
                "local function __TS__Unpack(list, i, j)\n    return {}(list, i, j)\nend\n",
                target.unpack_expression()
            ),
            LuaLibFeature::ArrayConcat => concat!(
                "local function __TS__ArrayConcat(arrays)\n",
                "    local result = {}\n",
                "    for i = 1, #arrays do\n",
                "        local array = arrays[i]\n",
                "        for j = 1, #array do\n",
                "            result[#result + 1] = array[j]\n",
                "        end\n",
                "    end\n",
                "    return result\nend\n",
            )
            .to_string(),
            LuaLibFeature::Class => concat!(
                "local function __TS__Class()\n",
                "    local class = {}\n",
                "    class.__index = class\n",
                "    return class\nend\n",
            )
            .to_string(),
        }
    }
}
