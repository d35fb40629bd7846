//! Late-bound COM automation over IDispatch.
//!
//! Excel is driven the way VBScript drives it: look up a member's DISPID by
//! name, then `Invoke` it as a property get, property put or method call.

#![cfg(windows)]

use std::mem::ManuallyDrop;
use std::ptr;

use windows::{
    core::{BSTR, GUID, HSTRING, PCWSTR},
    Win32::{
        Foundation::{DISP_E_EXCEPTION, VARIANT_BOOL},
        Globalization::GetSystemDefaultLCID,
        System::{
            Com::{
                CLSIDFromProgID, CoCreateInstance, IDispatch, CLSCTX_LOCAL_SERVER, DISPATCH_FLAGS,
                DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS,
                EXCEPINFO,
            },
            Ole::DISPID_PROPERTYPUT,
            Variant::{
                VARIANT, VT_BOOL, VT_BSTR, VT_DISPATCH, VT_EMPTY, VT_ERROR, VT_I2, VT_I4, VT_NULL,
                VT_R4, VT_R8,
            },
        },
    },
};

// -- VARIANT construction --
// VARIANT wraps its inner unions in ManuallyDrop; fields are set with
// ptr::write so nothing is dropped in place.

pub fn variant_empty() -> VARIANT {
    VARIANT::default()
}

pub fn variant_bool(val: bool) -> VARIANT {
    unsafe {
        let mut v = VARIANT::default();
        let inner = &mut *v.Anonymous.Anonymous;
        ptr::write(&mut inner.vt, VT_BOOL);
        ptr::write(
            &mut inner.Anonymous.boolVal,
            VARIANT_BOOL(if val { -1 } else { 0 }),
        );
        v
    }
}

pub fn variant_f64(val: f64) -> VARIANT {
    unsafe {
        let mut v = VARIANT::default();
        let inner = &mut *v.Anonymous.Anonymous;
        ptr::write(&mut inner.vt, VT_R8);
        ptr::write(&mut inner.Anonymous.dblVal, val);
        v
    }
}

pub fn variant_i32(val: i32) -> VARIANT {
    unsafe {
        let mut v = VARIANT::default();
        let inner = &mut *v.Anonymous.Anonymous;
        ptr::write(&mut inner.vt, VT_I4);
        ptr::write(&mut inner.Anonymous.lVal, val);
        v
    }
}

pub fn variant_str(val: &str) -> VARIANT {
    unsafe {
        let mut v = VARIANT::default();
        let inner = &mut *v.Anonymous.Anonymous;
        ptr::write(&mut inner.vt, VT_BSTR);
        ptr::write(
            &mut inner.Anonymous.bstrVal,
            ManuallyDrop::new(BSTR::from(val)),
        );
        v
    }
}

// -- VARIANT inspection --

fn vt(v: &VARIANT) -> windows::Win32::System::Variant::VARENUM {
    unsafe { v.Anonymous.Anonymous.vt }
}

pub fn variant_get_bool(v: &VARIANT) -> Option<bool> {
    (vt(v) == VT_BOOL).then(|| unsafe { v.Anonymous.Anonymous.Anonymous.boolVal.0 != 0 })
}

/// Numeric VARIANTs of any width, widened to f64.
pub fn variant_get_f64(v: &VARIANT) -> Option<f64> {
    unsafe {
        let anon = &v.Anonymous.Anonymous.Anonymous;
        match vt(v) {
            t if t == VT_R8 => Some(anon.dblVal),
            t if t == VT_R4 => Some(anon.fltVal as f64),
            t if t == VT_I4 => Some(anon.lVal as f64),
            t if t == VT_I2 => Some(anon.iVal as f64),
            _ => None,
        }
    }
}

pub fn variant_get_string(v: &VARIANT) -> Option<String> {
    (vt(v) == VT_BSTR).then(|| unsafe { v.Anonymous.Anonymous.Anonymous.bstrVal.to_string() })
}

fn variant_get_dispatch(v: &VARIANT) -> Option<IDispatch> {
    if vt(v) != VT_DISPATCH {
        return None;
    }
    // pdispVal is ManuallyDrop<Option<IDispatch>>
    let disp: &Option<IDispatch> = unsafe { &v.Anonymous.Anonymous.Anonymous.pdispVal };
    disp.clone()
}

pub fn variant_is_empty(v: &VARIANT) -> bool {
    vt(v) == VT_EMPTY || vt(v) == VT_NULL
}

pub fn variant_is_error(v: &VARIANT) -> bool {
    vt(v) == VT_ERROR
}

// -- DispatchObject --

/// An IDispatch COM object addressed by member names.
pub struct DispatchObject {
    inner: IDispatch,
}

impl DispatchObject {
    /// Create a COM object from a ProgID string (e.g., "Excel.Application").
    pub fn create_from_progid(progid: &str) -> Result<Self, String> {
        unsafe {
            let clsid = CLSIDFromProgID(&HSTRING::from(progid))
                .map_err(|e| format!("CLSIDFromProgID failed: {e}"))?;
            let inner: IDispatch = CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER)
                .map_err(|e| format!("CoCreateInstance failed for '{progid}': {e}"))?;
            Ok(Self { inner })
        }
    }

    fn dispid(&self, name: &str) -> Result<i32, String> {
        let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
        let names = [PCWSTR(wide.as_ptr())];
        let mut dispid = 0i32;
        unsafe {
            self.inner
                .GetIDsOfNames(
                    &GUID::zeroed(),
                    names.as_ptr(),
                    1,
                    GetSystemDefaultLCID(),
                    &mut dispid,
                )
                .map_err(|e| format!("GetIDsOfNames('{name}') failed: {e}"))?;
        }
        Ok(dispid)
    }

    /// Invoke `name` with arguments in natural order.
    fn invoke(&self, name: &str, flags: DISPATCH_FLAGS, args: &[VARIANT]) -> Result<VARIANT, String> {
        let dispid = self.dispid(name)?;

        // DISPPARAMS wants arguments last-to-first
        let mut reversed: Vec<VARIANT> = args.iter().rev().cloned().collect();
        let mut put_id = [DISPID_PROPERTYPUT];
        let is_put = flags == DISPATCH_PROPERTYPUT;
        let params = DISPPARAMS {
            rgvarg: if reversed.is_empty() {
                ptr::null_mut()
            } else {
                reversed.as_mut_ptr()
            },
            rgdispidNamedArgs: if is_put {
                put_id.as_mut_ptr()
            } else {
                ptr::null_mut()
            },
            cArgs: reversed.len() as u32,
            cNamedArgs: u32::from(is_put),
        };

        let mut result = VARIANT::default();
        let result_ptr: Option<*mut VARIANT> = if is_put { None } else { Some(&mut result) };
        let mut except = EXCEPINFO::default();
        unsafe {
            self.inner
                .Invoke(
                    dispid,
                    &GUID::zeroed(),
                    GetSystemDefaultLCID(),
                    flags,
                    &params,
                    result_ptr,
                    Some(&mut except),
                    None,
                )
                .map_err(|e| format_invoke_error(e, &except, name))?;
        }
        Ok(result)
    }

    /// `obj.Name`
    pub fn get(&self, name: &str) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_PROPERTYGET, &[])
    }

    /// `obj.Name = value`
    pub fn put(&self, name: &str, value: VARIANT) -> Result<(), String> {
        self.invoke(name, DISPATCH_PROPERTYPUT, &[value]).map(|_| ())
    }

    /// `obj.Name(args...)`
    pub fn call(&self, name: &str, args: &[VARIANT]) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_METHOD, args)
    }

    /// `obj.Name` where the property is itself an object.
    pub fn child(&self, name: &str) -> Result<DispatchObject, String> {
        to_object(&self.get(name)?, name)
    }

    /// `obj.Name(args...)` returning an object, e.g. `Workbooks.Open(path)`.
    pub fn call_child(&self, name: &str, args: &[VARIANT]) -> Result<DispatchObject, String> {
        to_object(&self.call(name, args)?, name)
    }

    /// Indexed property returning an object, e.g. `Worksheets(1)` or `Range("A1")`.
    pub fn item(&self, name: &str, index: VARIANT) -> Result<DispatchObject, String> {
        to_object(&self.invoke(name, DISPATCH_PROPERTYGET, &[index])?, name)
    }
}

fn to_object(variant: &VARIANT, context: &str) -> Result<DispatchObject, String> {
    if let Some(inner) = variant_get_dispatch(variant) {
        Ok(DispatchObject { inner })
    } else if variant_is_empty(variant) {
        Err(format!("'{context}' returned empty/null"))
    } else {
        Err(format!(
            "'{context}' returned non-object VARIANT (VT={}), expected VT_DISPATCH",
            vt(variant).0
        ))
    }
}

/// Prefer Excel's own description when the failure is a COM exception.
fn format_invoke_error(err: windows::core::Error, except: &EXCEPINFO, member_name: &str) -> String {
    if err.code().0 as u32 != DISP_E_EXCEPTION.0 as u32 {
        return format!("Invoke('{member_name}') failed: {err}");
    }
    if except.bstrDescription.is_empty() {
        format!("COM exception in '{member_name}' (no description)")
    } else {
        except.bstrDescription.to_string()
    }
}
