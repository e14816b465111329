use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Reserved and contextual keywords of the analysed language (C#).
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
    // contextual
    "async", "await", "dynamic", "nameof", "nint", "notnull", "nuint", "partial", "record",
    "unmanaged", "var", "where", "yield",
];

/// Built-in value types, primitive aliases and common framework types that never
/// resolve to a project unit.
pub const COMMON_TYPES: &[&str] = &[
    // value types and primitive aliases
    "Boolean", "Byte", "SByte", "Char", "Decimal", "Double", "Single", "Int16", "Int32",
    "Int64", "UInt16", "UInt32", "UInt64", "IntPtr", "UIntPtr", "String", "Object", "Void",
    "DateTime", "TimeSpan", "Guid", "Type", "Enum", "Exception", "Nullable", "Tuple",
    "ValueTuple", "Span", "ReadOnlySpan", "Memory",
    // collections
    "Array", "List", "IList", "Dictionary", "IDictionary", "HashSet", "ISet", "Queue",
    "Stack", "LinkedList", "SortedList", "SortedDictionary", "SortedSet", "IEnumerable",
    "IEnumerator", "ICollection", "IReadOnlyList", "IReadOnlyCollection",
    "IReadOnlyDictionary", "KeyValuePair", "ConcurrentDictionary", "ConcurrentQueue",
    "ConcurrentBag",
    // delegates and tasks
    "Action", "Func", "Predicate", "EventHandler", "Task", "ValueTask", "IDisposable",
    "IEquatable", "IComparable", "IComparer", "IEqualityComparer",
    // framework attributes
    "Attribute", "SerializableAttribute", "ObsoleteAttribute", "FlagsAttribute",
    "NonSerializedAttribute", "AttributeUsageAttribute", "ConditionalAttribute",
];

static KEYWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| KEYWORDS.iter().copied().collect());

static COMMON_TYPE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| COMMON_TYPES.iter().copied().collect());

/// Case-insensitive keyword check
pub fn is_keyword(token: &str) -> bool {
    KEYWORD_SET.contains(token.to_ascii_lowercase().as_str())
}

/// Exact-case allow-list check on the token and on its last qualified segment
/// (`System.Collections.Generic.List` is as common as `List`).
pub fn is_common_type(token: &str) -> bool {
    COMMON_TYPE_SET.contains(token) || COMMON_TYPE_SET.contains(last_segment(token))
}

/// True when a normalized token must not appear in a ReferenceSet
pub fn is_filtered(token: &str) -> bool {
    is_keyword(token) || is_keyword(last_segment(token)) || is_common_type(token)
}

pub(crate) fn last_segment(token: &str) -> &str {
    token
        .rsplit(|c: char| c == '.' || c == ':')
        .find(|segment| !segment.is_empty())
        .unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_match_case_insensitively() {
        assert!(is_keyword("int"));
        assert!(is_keyword("Int"));
        assert!(is_keyword("VOID"));
        assert!(!is_keyword("Player"));
    }

    #[test]
    fn common_types_match_qualified_names() {
        assert!(is_common_type("List"));
        assert!(is_common_type("System.Collections.Generic.List"));
        assert!(!is_common_type("list"));
        assert!(!is_common_type("Inventory"));
    }

    #[test]
    fn filtered_covers_both_tables() {
        assert!(is_filtered("string"));
        assert!(is_filtered("System.String"));
        assert!(is_filtered("Dictionary"));
        assert!(!is_filtered("Game.Inventory"));
    }

    #[test]
    fn last_segment_handles_both_separators() {
        assert_eq!(last_segment("A.B.C"), "C");
        assert_eq!(last_segment("global::A.B"), "B");
        assert_eq!(last_segment("Plain"), "Plain");
    }
}
