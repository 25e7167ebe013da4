use std::env;
use std::fs;
use std::path::PathBuf;
use std::ptr;

const SIZE_VAR: &str = "SMALLFN_BUFFER_SIZE";
const ALIGN_VAR: &str = "SMALLFN_BUFFER_ALIGN";

#[allow(dead_code)]
struct Sample(usize);

trait SomeTrait {
    fn call_me(&self) -> bool {
        true
    }
}

impl SomeTrait for Sample {}

fn layout_broken(what: &str) {
    panic!(
        concat!(
            "Assumptions on layout are broken, this crate relies on ",
            "`unsafe code guidelines` layout specification, ",
            "now layout of {:?} is broken, report about it on github"
        ),
        what
    );
}

/// Tests the layout assumption `sptr` relies on: the data pointer is the
/// first word of a trait object pointer.
fn test_ptr_layouts() {
    #[repr(C)]
    struct DynObj {
        data_ptr: *const u8,
        vtable: *const u8,
    }

    let sample = Box::new(Sample(100));
    let data_ptr = Box::into_raw(sample);

    let trait_obj: *const dyn SomeTrait = data_ptr;
    let dyn_obj_repr: DynObj = unsafe { ptr::read(ptr::addr_of!(trait_obj) as *const DynObj) };

    if dyn_obj_repr.data_ptr != data_ptr as *const u8 {
        layout_broken("trait objects");
    }
    let out = unsafe { Box::from_raw(data_ptr) };
    out.call_me();
}

fn read_var(name: &str) -> Option<usize> {
    println!("cargo:rerun-if-env-changed={}", name);
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => panic!("`{}` must be an unsigned integer, got {:?}", name, raw),
    }
}

/// Resolves the inline buffer footprint of `DefaultSpace`.
///
/// Both variables must be given together; the alignment must be a power of two
/// no smaller than the size, and both must hold an empty holder (two words).
fn default_space() -> (usize, usize) {
    let word = env::var("CARGO_CFG_TARGET_POINTER_WIDTH")
        .ok()
        .and_then(|bits| bits.parse::<usize>().ok())
        .map_or(8, |bits| bits / 8);

    let (size, align) = match (read_var(SIZE_VAR), read_var(ALIGN_VAR)) {
        (None, None) => return (word * 8, word * 8),
        (Some(size), Some(align)) => (size, align),
        (Some(_), None) => panic!("`{}` must be set together with `{}`", ALIGN_VAR, SIZE_VAR),
        (None, Some(_)) => panic!("`{}` must be set together with `{}`", SIZE_VAR, ALIGN_VAR),
    };

    if !align.is_power_of_two() {
        panic!("`{}` must be a power of two, got {}", ALIGN_VAR, align);
    }
    if align < size {
        panic!(
            "`{}` ({}) must be greater than or equal to `{}` ({})",
            ALIGN_VAR, align, SIZE_VAR, size
        );
    }
    if size < word * 2 {
        panic!(
            "`{}` ({}) cannot hold an empty holder, which needs {} bytes",
            SIZE_VAR,
            size,
            word * 2
        );
    }

    (size, align)
}

fn main() {
    // NOTE: this will not protect from every possible case,
    // host layout may be different from target layout.
    test_ptr_layouts();

    let (size, align) = default_space();
    let source = format!(
        concat!(
            "/// Inline buffer used by [`StackFn`](crate::StackFn) when no `Space` is given.\n",
            "///\n",
            "/// {size} bytes aligned to {align}; override with `{size_var}` and `{align_var}`.\n",
            "#[repr(C, align({align}))]\n",
            "pub struct DefaultSpace([u8; {size}]);\n",
        ),
        size = size,
        align = align,
        size_var = SIZE_VAR,
        align_var = ALIGN_VAR,
    );

    let out = PathBuf::from(env::var_os("OUT_DIR").expect("cargo sets OUT_DIR"));
    fs::write(out.join("default_space.rs"), source).expect("failed to write default_space.rs");
    println!("cargo:rerun-if-changed=build.rs");
}
