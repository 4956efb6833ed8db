mod array;
mod option;
mod scalar;
mod tuple;
