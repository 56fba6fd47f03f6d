// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Guest modules used by adapter, probe and runner tests.
//!
//! Each fixture implements the transform contract with a fixed timestamp. JSON
//! validation is limited to the first byte, which is enough to tell documents
//! apart from `invalid json {`.

/// Shared guest core: memory, bump allocator, output builder.
///
/// `dealloc` never frees; it increments the exported `released` global.
///
/// Static data layout:
/// - 0..12 `{"original":`
/// - 64..123 `,"transformed":true,"timestamp":"2025-01-01T00:00:00.000Z"}`
/// - 256..282 `failed to parse input JSON`
/// - 320..340 `{"status":"healthy"}`
/// - heap starts at 1024
const CORE: &str = r##"
  (memory (export "memory") 17)
  (global $heap (mut i32) (i32.const 1024))
  (data (i32.const 0) "{\"original\":")
  (data (i32.const 64) ",\"transformed\":true,\"timestamp\":\"2025-01-01T00:00:00.000Z\"}")
  (data (i32.const 256) "failed to parse input JSON")
  (data (i32.const 320) "{\"status\":\"healthy\"}")

  (func $alloc (export "alloc") (param $len i32) (result i32)
    (local $ptr i32) (local $end i32) (local $have i32)
    (local.set $ptr (global.get $heap))
    (local.set $end
      (i32.and
        (i32.add (i32.add (local.get $ptr) (local.get $len)) (i32.const 7))
        (i32.const -8)))
    (local.set $have (i32.mul (memory.size) (i32.const 65536)))
    (if (i32.gt_u (local.get $end) (local.get $have))
      (then
        (if (i32.eq
              (memory.grow
                (i32.add
                  (i32.shr_u (i32.sub (local.get $end) (local.get $have)) (i32.const 16))
                  (i32.const 1)))
              (i32.const -1))
          (then (return (i32.const 0))))))
    (global.set $heap (local.get $end))
    (local.get $ptr))

  ;; counts releases so tests can check the host hands buffers back
  (global $released (export "released") (mut i32) (i32.const 0))
  (func $dealloc (export "dealloc") (param i32 i32)
    (global.set $released (i32.add (global.get $released) (i32.const 1))))

  (func $is_json_start (param $b i32) (result i32)
    (i32.or
      (i32.or
        (i32.or (i32.eq (local.get $b) (i32.const 123)) (i32.eq (local.get $b) (i32.const 91)))
        (i32.or (i32.eq (local.get $b) (i32.const 34)) (i32.eq (local.get $b) (i32.const 45))))
      (i32.or
        (i32.and
          (i32.ge_u (local.get $b) (i32.const 48))
          (i32.le_u (local.get $b) (i32.const 57)))
        (i32.or
          (i32.eq (local.get $b) (i32.const 116))
          (i32.or (i32.eq (local.get $b) (i32.const 102)) (i32.eq (local.get $b) (i32.const 110)))))))

  (func $valid (param $in i32) (param $len i32) (result i32)
    (if (i32.eqz (local.get $len)) (then (return (i32.const 0))))
    (call $is_json_start (i32.load8_u (local.get $in))))

  ;; returns the output pointer, or 0 for invalid input; output length is len + 71
  (func $build (param $in i32) (param $len i32) (result i32)
    (local $out i32)
    (if (i32.eqz (call $valid (local.get $in) (local.get $len)))
      (then (return (i32.const 0))))
    (local.set $out (call $alloc (i32.add (local.get $len) (i32.const 71))))
    (if (i32.eqz (local.get $out)) (then (return (i32.const 0))))
    (memory.copy (local.get $out) (i32.const 0) (i32.const 12))
    (memory.copy (i32.add (local.get $out) (i32.const 12)) (local.get $in) (local.get $len))
    (memory.copy
      (i32.add (i32.add (local.get $out) (i32.const 12)) (local.get $len))
      (i32.const 64)
      (i32.const 59))
    (local.get $out))
"##;

/// Buffer ABI operation exports.
const BUFFER_OPS: &str = r##"
  (func (export "transform") (param $in i32) (param $len i32) (param $out_len_ptr i32) (result i32)
    (local $out i32)
    (local.set $out (call $build (local.get $in) (local.get $len)))
    (if (i32.eqz (local.get $out))
      (then
        (i32.store (local.get $out_len_ptr) (i32.const -26))
        (return (i32.const 256))))
    (i32.store (local.get $out_len_ptr) (i32.add (local.get $len) (i32.const 71)))
    (local.get $out))
"##;

const HEALTH_OP: &str = r##"
  (func (export "health_check") (param i32 i32) (param $out_len_ptr i32) (result i32)
    (i32.store (local.get $out_len_ptr) (i32.const 20))
    (i32.const 320))
"##;

fn compile(source: &str) -> Vec<u8> {
    wat::parse_str(source).expect("fixture WAT must parse")
}

/// Native module: no imports, buffer ABI.
pub fn native_module() -> Vec<u8> {
    compile(&format!("(module {} {} {})", CORE, BUFFER_OPS, HEALTH_OP))
}

/// Native module that lacks the `health_check` export.
pub const NATIVE_MISSING_HEALTH_WAT: &str = r##"
(module
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 1024))
  (data (i32.const 16) "{}")
  (func (export "alloc") (param $len i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (i32.add (local.get $len) (i32.const 8))))
    (local.get $ptr))
  (func (export "dealloc") (param i32 i32))
  (func (export "transform") (param i32 i32) (param $out_len_ptr i32) (result i32)
    (i32.store (local.get $out_len_ptr) (i32.const 2))
    (i32.const 16)))
"##;

/// Native module whose `dealloc` always traps.
pub const NATIVE_TRAPPING_DEALLOC_WAT: &str = r##"
(module
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 1024))
  (data (i32.const 16) "{}")
  (func (export "alloc") (param $len i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (i32.add (local.get $len) (i32.const 8))))
    (local.get $ptr))
  (func (export "dealloc") (param i32 i32)
    unreachable)
  (func (export "transform") (param i32 i32) (param $out_len_ptr i32) (result i32)
    (i32.store (local.get $out_len_ptr) (i32.const 2))
    (i32.const 16)))
"##;

/// Module that claims to be native but imports a host function.
pub const NATIVE_WITH_IMPORT_WAT: &str = r#"
(module
  (import "env" "now" (func $now (result f64)))
  (memory (export "memory") 1))
"#;

/// WASI reactor: refuses to transform before `_initialize` ran.
pub fn reactor_module() -> Vec<u8> {
    compile(&format!(
        r##"(module
  (import "wasi_snapshot_preview1" "clock_time_get" (func $clock (param i32 i64 i32) (result i32)))
  {core}
  (global $initialized (mut i32) (i32.const 0))
  (func (export "_initialize")
    (drop (call $clock (i32.const 0) (i64.const 1000) (i32.const 512)))
    (global.set $initialized (i32.const 1)))
  (func (export "transform") (param $in i32) (param $len i32) (param $out_len_ptr i32) (result i32)
    (local $out i32)
    (if (i32.eqz (global.get $initialized)) (then unreachable))
    (local.set $out (call $build (local.get $in) (local.get $len)))
    (if (i32.eqz (local.get $out))
      (then
        (i32.store (local.get $out_len_ptr) (i32.const -26))
        (return (i32.const 256))))
    (i32.store (local.get $out_len_ptr) (i32.add (local.get $len) (i32.const 71)))
    (local.get $out))
  {health})"##,
        core = CORE,
        health = HEALTH_OP
    ))
}

/// WASI command: reads stdin, picks the operation from argv[1], writes stdout.
///
/// Invalid input writes the parse error to stderr and exits with status 1.
pub fn command_module() -> Vec<u8> {
    compile(&format!(
        r##"(module
  (import "wasi_snapshot_preview1" "fd_read" (func $fd_read (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_write" (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "args_sizes_get" (func $args_sizes_get (param i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "args_get" (func $args_get (param i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "proc_exit" (func $proc_exit (param i32)))
  {core}
  ;; fd_write may accept fewer bytes than offered; keep going until done
  (func $write_all (param $fd i32) (param $ptr i32) (param $len i32)
    (local $n i32)
    (block $done
      (loop $more
        (br_if $done (i32.eqz (local.get $len)))
        (i32.store (i32.const 200) (local.get $ptr))
        (i32.store (i32.const 204) (local.get $len))
        (br_if $done (call $fd_write (local.get $fd) (i32.const 200) (i32.const 1) (i32.const 240)))
        (local.set $n (i32.load (i32.const 240)))
        (br_if $done (i32.eqz (local.get $n)))
        (local.set $ptr (i32.add (local.get $ptr) (local.get $n)))
        (local.set $len (i32.sub (local.get $len) (local.get $n)))
        (br $more))))

  (func (export "_start")
    (local $total i32) (local $n i32)
    ;; argv[1] selects the operation
    (drop (call $args_sizes_get (i32.const 32) (i32.const 36)))
    (drop (call $args_get (i32.const 400) (i32.const 448)))
    (if (i32.ge_u (i32.load (i32.const 32)) (i32.const 2))
      (then
        (if (i32.eq (i32.load8_u (i32.load (i32.const 404))) (i32.const 104))
          (then
            (call $write_all (i32.const 1) (i32.const 320) (i32.const 20))
            (return)))))

    ;; drain stdin into 131084.., leaving room for the prefix
    (block $done
      (loop $read
        (br_if $done (i32.ge_u (local.get $total) (i32.const 524288)))
        (i32.store (i32.const 16) (i32.add (i32.const 131084) (local.get $total)))
        (i32.store (i32.const 20) (i32.sub (i32.const 524288) (local.get $total)))
        (if (call $fd_read (i32.const 0) (i32.const 16) (i32.const 1) (i32.const 24))
          (then (call $proc_exit (i32.const 2))))
        (local.set $n (i32.load (i32.const 24)))
        (br_if $done (i32.eqz (local.get $n)))
        (local.set $total (i32.add (local.get $total) (local.get $n)))
        (br $read)))

    (if (i32.eqz (call $valid (i32.const 131084) (local.get $total)))
      (then
        (call $write_all (i32.const 2) (i32.const 256) (i32.const 26))
        (call $proc_exit (i32.const 1))))

    ;; one contiguous document: prefix, input, suffix
    (memory.copy (i32.const 131072) (i32.const 0) (i32.const 12))
    (memory.copy
      (i32.add (i32.const 131084) (local.get $total))
      (i32.const 64)
      (i32.const 59))
    (call $write_all (i32.const 1) (i32.const 131072) (i32.add (local.get $total) (i32.const 71)))))"##,
        core = CORE
    ))
}

const SHIM_IMPORTS: &str = r#"
  (import "shim" "expose" (func $expose (param i32 i32 i32)))
  (import "shim" "ready" (func $ready))
  (import "shim" "resolve" (func $resolve (param i32 i32)))
  (import "shim" "reject" (func $reject (param i32 i32)))
"#;

const SHIM_OPS: &str = r##"
  (table (export "__indirect_function_table") 2 funcref)
  (elem (i32.const 0) $transformData $healthCheck)
  (data (i32.const 400) "transformData")
  (data (i32.const 420) "healthCheck")

  (func $transformData (param $in i32) (param $len i32)
    (local $out i32)
    (local.set $out (call $build (local.get $in) (local.get $len)))
    (if (i32.eqz (local.get $out))
      (then
        (call $reject (i32.const 256) (i32.const 26))
        (return)))
    (call $resolve (local.get $out) (i32.add (local.get $len) (i32.const 71))))

  (func $healthCheck (param i32 i32)
    (call $resolve (i32.const 320) (i32.const 20)))
"##;

/// Host-runtime module: exposes two operations, then signals readiness.
pub fn shim_module() -> Vec<u8> {
    compile(&format!(
        r#"(module {imports} {core} {ops}
  (func (export "_start")
    (call $expose (i32.const 400) (i32.const 13) (i32.const 0))
    (call $expose (i32.const 420) (i32.const 11) (i32.const 1))
    (call $ready)))"#,
        imports = SHIM_IMPORTS,
        core = CORE,
        ops = SHIM_OPS
    ))
}

/// Host-runtime module whose entry point returns without signalling readiness.
pub fn shim_never_ready_module() -> Vec<u8> {
    compile(&format!(
        r#"(module {imports} {core} {ops}
  (func (export "_start")
    (call $expose (i32.const 400) (i32.const 13) (i32.const 0))))"#,
        imports = SHIM_IMPORTS,
        core = CORE,
        ops = SHIM_OPS
    ))
}

/// Glue manifest matching [`shim_module`].
pub const SHIM_GLUE_YAML: &str = r#"
entry_point: _start
operations:
  transform: transformData
  healthCheck: healthCheck
"#;
