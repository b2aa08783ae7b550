//! The fixed rule sets the analyzer checks contract source against (§4.1).
//!
//! These are the only things the analyzer knows about a contract: no type
//! checking, no semantic analysis, just substring/exact-token matching
//! against these lists.

/// Prefixes an `import`/`using` declaration's target must match. Anything
/// else is rejected outright.
pub const ALLOWED_NAMESPACE_PREFIXES: &[&str] = &[
    "System",
    "System.Collections",
    "System.Collections.Generic",
    "System.Text",
    "System.Text.Json",
    "System.IO.Compression",
    "System.Linq",
    "System.Threading",
    "System.Threading.Tasks",
    "System.Diagnostics",
    "System.Net.Http",
    "System.Xml",
    "System.Xml.Linq",
];

/// Substrings of a constructed type's name that mark it a forbidden class
/// (filesystem, sockets, process, reflection, raw crypto streams, console,
/// debugger, service control, platform interop).
pub const FORBIDDEN_CLASSES: &[&str] = &[
    "File",
    "FileStream",
    "FileInfo",
    "Directory",
    "DirectoryInfo",
    "Socket",
    "TcpClient",
    "TcpListener",
    "UdpClient",
    "Process",
    "ProcessStartInfo",
    "Assembly",
    "AssemblyLoadContext",
    "CryptoStream",
    "Console",
    "Debugger",
    "ServiceController",
    "Marshal",
    "DllImportAttribute",
];

/// Substrings of a called method's name that mark it forbidden (process
/// start/invoke, filesystem I/O, socket binding, crypto streams, registry,
/// assembly loading, thread-pool queuing).
pub const FORBIDDEN_METHODS: &[&str] = &[
    "Start",
    "Invoke",
    "Load",
    "Execute",
    "ReadAllText",
    "ReadAllBytes",
    "WriteAllText",
    "WriteAllBytes",
    "ReadAllLines",
    "OpenRead",
    "OpenWrite",
    "Bind",
    "Connect",
    "Listen",
    "Encrypt",
    "Decrypt",
    "RegistryKey",
    "LoadFrom",
    "LoadFile",
    "QueueUserWorkItem",
];

/// Lexical tokens rejected regardless of context, matched exactly (not as a
/// substring of a longer identifier).
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "unsafe",
    "dynamic",
    "DllImport",
    "extern",
    "lock",
    "goto",
    "volatile",
    "fixed",
    "stackalloc",
    "yield",
    "sealed",
    "base",
    "ref",
    "partial",
    "override",
];
